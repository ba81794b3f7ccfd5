//! Draw-order layer codes.
//!
//! A layer code is `group * 11 + 5 + offset`, where `group` indexes
//! [`LAYER_GROUPS`] and `offset` lies in `-5..=5`. Codes therefore form a
//! total order over `0..110`.

use std::fmt;

/// Layer group names, in draw order.
pub const LAYER_GROUPS: [&str; 10] = [
    "terrain",
    "beaches",
    "shoulders",
    "taxiways",
    "runways",
    "markings",
    "roads",
    "objects",
    "light_objects",
    "cars",
];

/// Sub-layers per group.
const GROUP_SPAN: i32 = 11;
/// Sub-layer of offset zero within a group.
const GROUP_CENTRE: i32 = 5;
/// Largest permitted offset magnitude.
const MAX_OFFSET: i32 = 5;

/// Errors from [`Layer::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    #[error("layer offset {0} is outside -5..=5")]
    InvalidLayerOffset(i32),
    #[error("layer code {0} is out of range")]
    InvalidLayerCode(i32),
    #[error("unknown layer group {0:?}")]
    UnknownGroup(String),
}

/// A draw-order layer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Layer(u8);

impl Layer {
    /// Number of distinct layer codes.
    pub const COUNT: u8 = (LAYER_GROUPS.len() as i32 * GROUP_SPAN) as u8;

    pub const TERRAIN: Self = Self::centre(0);
    pub const BEACHES: Self = Self::centre(1);
    pub const SHOULDERS: Self = Self::centre(2);
    pub const TAXIWAYS: Self = Self::centre(3);
    pub const RUNWAYS: Self = Self::centre(4);
    pub const MARKINGS: Self = Self::centre(5);
    /// Road networks.
    pub const NETWORK: Self = Self::centre(6);
    /// Outlines drawn for exclusions and forests.
    pub const OUTLINE: Self = Self::centre(6);
    /// Ordinary objects.
    pub const DEFAULT: Self = Self::centre(7);
    /// Just beneath ordinary objects, for decals that set a polygon offset.
    pub const BELOW_DEFAULT: Self = Self(Self::DEFAULT.0 - 1);

    const fn centre(group: u8) -> Self {
        Self(group * GROUP_SPAN as u8 + GROUP_CENTRE as u8)
    }

    /// Resolve a layer group name and offset, as found in `LAYER_GROUP` and
    /// `ATTR_layer_group` records.
    ///
    /// `"airports"` is an alias: negative offsets go to shoulders, positive
    /// ones to markings and zero to runways.
    pub fn new(group: &str, offset: i32) -> Result<Self, LayerError> {
        if !(-MAX_OFFSET..=MAX_OFFSET).contains(&offset) {
            return Err(LayerError::InvalidLayerOffset(offset));
        }
        let group = if group == "airports" {
            match offset.signum() {
                -1 => "shoulders",
                1 => "markings",
                // Not expected from real files.
                _ => "runways",
            }
        } else {
            group
        };
        let index = LAYER_GROUPS
            .iter()
            .position(|&name| name == group)
            .ok_or_else(|| LayerError::UnknownGroup(group.to_owned()))?;
        let code = index as i32 * GROUP_SPAN + GROUP_CENTRE + offset;
        Self::from_code(code).ok_or(LayerError::InvalidLayerCode(code))
    }

    /// The layer with the given raw code, if in range.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        u8::try_from(code)
            .ok()
            .filter(|&c| c < Self::COUNT)
            .map(Self)
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Group name.
    #[must_use]
    pub fn group(self) -> &'static str {
        LAYER_GROUPS[usize::from(self.0) / GROUP_SPAN as usize]
    }

    /// Offset within the group, in `-5..=5`.
    #[must_use]
    pub fn offset(self) -> i32 {
        i32::from(self.0) % GROUP_SPAN - GROUP_CENTRE
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}", self.group(), self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn named_layers() {
        assert_eq!(Layer::TERRAIN.code(), 5);
        assert_eq!(Layer::DEFAULT.code(), 82);
        assert_eq!(Layer::BELOW_DEFAULT.to_string(), "objects -1");
        assert_eq!(Layer::NETWORK, Layer::OUTLINE);
        assert_eq!(Layer::COUNT, 110);
    }

    #[test]
    fn airports_alias() {
        assert_eq!(Layer::new("airports", 0), Ok(Layer::RUNWAYS));
        assert_eq!(Layer::new("airports", -2).unwrap().to_string(), "shoulders -2");
        assert_eq!(Layer::new("airports", 4).unwrap().to_string(), "markings +4");
    }

    #[test]
    fn rejects_bad_offsets_and_groups() {
        assert_eq!(
            Layer::new("objects", 6),
            Err(LayerError::InvalidLayerOffset(6))
        );
        assert_eq!(
            Layer::new("objects", -6),
            Err(LayerError::InvalidLayerOffset(-6))
        );
        assert_eq!(
            Layer::new("sky", 0),
            Err(LayerError::UnknownGroup("sky".to_owned()))
        );
    }

    #[test]
    fn from_code_bounds() {
        assert_eq!(Layer::from_code(-1), None);
        assert_eq!(Layer::from_code(110), None);
        assert_eq!(Layer::from_code(0).map(|l| l.to_string()).as_deref(), Some("terrain -5"));
        assert_eq!(Layer::from_code(109).map(|l| l.to_string()).as_deref(), Some("cars +5"));
    }

    proptest! {
        #[test]
        fn name_round_trips(group in prop::sample::select(LAYER_GROUPS.to_vec()), offset in -5i32..=5) {
            let layer = Layer::new(group, offset).unwrap();
            prop_assert_eq!(layer.group(), group);
            prop_assert_eq!(layer.offset(), offset);
            prop_assert_eq!(layer.to_string(), format!("{group} {offset:+}"));
        }

        #[test]
        fn out_of_range_offsets_fail(group in prop::sample::select(LAYER_GROUPS.to_vec()), offset in 6i32..100, negate in any::<bool>()) {
            let offset = if negate { -offset } else { offset };
            prop_assert_eq!(Layer::new(group, offset), Err(LayerError::InvalidLayerOffset(offset)));
        }
    }
}
