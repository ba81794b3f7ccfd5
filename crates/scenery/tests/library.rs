//! Batch loading over an on-disk library.

use std::fs;
use std::path::{Path, PathBuf};

use scenery::{Library, LoadStatus};
use scenery_decode::{
    AssetPaths, AttachedObject, Category, Definition, GeometryDefinition, Layer, RoadNetwork,
};

const OBJECT: &str = "I\n800\nOBJ\nTEXTURE shed.png\n\
    VT 0 0 0 0 1 0 0 0\nVT 1 2 0 0 1 0 1 0\nVT 0 0 1 0 1 0 0 1\n\
    IDX10 0 1 2 0 2 1 0 0 0 0\n\
    TRIS 0 3\nATTR_no_cull\nTRIS 3 3\n";

struct Scenery {
    dir: tempfile::TempDir,
}

impl Scenery {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let resources = dir.path().join("Resources");
        fs::create_dir_all(&resources).unwrap();
        image::RgbaImage::new(1, 1)
            .save(resources.join("fallback.png"))
            .unwrap();
        Self { dir }
    }

    fn library(&self) -> Library {
        Library::new(AssetPaths::new(self.dir.path().join("Resources")))
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("lib")
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn texture(&self, name: &str) {
        let path = self.root().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::new(2, 2).save(path).unwrap();
    }
}

#[test]
fn scan_finds_definitions_recursively() {
    let scenery = Scenery::new();
    scenery.write("objects/shed.obj", OBJECT);
    scenery.write("objects/deep/LAMP.OBJ", OBJECT);
    scenery.write("ground.pol", "A\n850\nDRAPED_POLYGON\n");
    scenery.write("readme.txt", "not scenery");
    scenery.write("sand.bch", "");

    let found = Library::scan(&scenery.root()).unwrap();
    let names: Vec<_> = found
        .iter()
        .map(|p| p.strip_prefix(scenery.root()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("ground.pol"),
            Path::new("objects").join("deep").join("LAMP.OBJ"),
            Path::new("objects").join("shed.obj"),
        ]
    );
}

#[cfg(unix)]
#[test]
fn scan_does_not_follow_directory_links() {
    let scenery = Scenery::new();
    scenery.write("objects/shed.obj", OBJECT);
    std::os::unix::fs::symlink(scenery.root(), scenery.root().join("objects").join("loop"))
        .unwrap();

    let found = Library::scan(&scenery.root()).unwrap();
    assert_eq!(found, vec![scenery.root().join("objects").join("shed.obj")]);
}

#[test]
fn batch_load_substitutes_and_reports() {
    let scenery = Scenery::new();
    scenery.texture("shed.png");
    let shed = scenery.write("shed.obj", OBJECT);
    let broken = scenery.write("broken.fac", "A\n800\nFACADE\nLOD 0 10\nWALL 0 1\n");
    let untextured = scenery.write("lawn.pol", "A\n850\nDRAPED_POLYGON\nTEXTURE grass.png\n");
    let skipped = scenery.write("roads.net", "");
    let missing = scenery.root().join("missing.obj");

    let mut library = scenery.library();
    let report = library.load_batch([&shed, &broken, &untextured, &skipped, &missing, &shed]);

    assert_eq!(report.loaded, 2);
    assert_eq!(report.cached, 1);
    assert_eq!(report.skipped, vec![skipped.clone()]);
    let unreadable: Vec<_> = report.unreadable.iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(unreadable, vec![broken.clone(), missing.clone()]);
    assert_eq!(report.textures.len(), 1);
    assert_eq!(report.textures[0].0, untextured);
    assert_eq!(report.textures[0].1.filename, "grass");

    let summary = report.summary().unwrap();
    assert!(summary.contains("Can't read 2 files:"));
    assert!(summary.contains("Can't read 1 texture:"));

    // Placeholders stand in for what failed.
    let facade = library.get(&broken).unwrap();
    assert_eq!(facade.category(), Category::Facade);
    assert!(!facade.is_previewable());
    let marker = library.get(&missing).unwrap();
    assert!(matches!(marker, Definition::Object(mesh) if mesh.vertices().len() == 18));
    assert!(library.get(&skipped).is_none());

    let shed_def = library.get(&shed).unwrap();
    assert!(shed_def.is_previewable());
    assert!(!shed_def.texture().is_none());
}

#[test]
fn draw_calls_survive_flush_and_reallocate() {
    let scenery = Scenery::new();
    let shed = scenery.write("shed.obj", OBJECT);
    let mut library = scenery.library();
    assert!(matches!(library.load(&shed), LoadStatus::Loaded));

    let call = library.draw_call(&shed).unwrap();
    assert_eq!((call.base, call.culled, call.no_cull), (0, 3, 3));
    assert_eq!(call.layer, Layer::DEFAULT);

    library.flush();
    assert!(library.draw_call(&shed).is_none());
    assert!(library.arena().is_empty());

    library.allocate_all();
    library.allocate_all();
    assert_eq!(library.arena().len(), 6);
    assert_eq!(library.draw_call(&shed).unwrap().base, 0);
}

#[test]
fn networks_share_attached_objects() {
    let scenery = Scenery::new();
    let pylon = scenery.write(
        "pylon.obj",
        "I\n700\nOBJ\nnone\ntri\n0 0 0 0 0\n1 20 0 0 0\n0 0 1 0 0\nend\n",
    );
    let table = scenery.write("roads.net", "");
    let mut library = scenery.library();
    library.load(&pylon);

    let paths = AssetPaths::new(scenery.dir.path().join("Resources"));
    for index in 0..2 {
        let mut network = RoadNetwork::new(&table, &paths, "Powerline", index);
        network.objects.push(AttachedObject {
            path: pylon.clone(),
            lateral: 0.0,
            on_ground: true,
            frequency: 60.0,
            offset: 0.0,
        });
        library.add_network(network);
    }
    library.allocate_all();

    assert_eq!(library.definitions().len(), 1);
    assert_eq!(library.arena().len(), 3);
    for network in library.networks() {
        assert_eq!(network.height, Some(20.0));
    }
}

#[test]
fn exclusions_need_no_file() {
    let scenery = Scenery::new();
    let mut library = scenery.library();
    let path = Path::new("Exclude:Facades");
    assert!(matches!(library.load(path), LoadStatus::Loaded));
    let exclusion = library.get(path).unwrap();
    assert_eq!(exclusion.category(), Category::Exclusion);
    assert_eq!(exclusion.layer(), Layer::OUTLINE);
}
