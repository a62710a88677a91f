use std::fs;

use asset::{
    ExportOptions, export_to_path, import::obj::import_obj, load_asset_from_path,
    scene::{Material, Node, Scene, SceneMesh},
    texture::TextureData,
};

fn textured_triangle(name: &str, z: f32, material: usize) -> SceneMesh {
    SceneMesh::triangles(
        name,
        vec![[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
        vec![0, 1, 2],
    )
    .with_uvs(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
    .with_material(material)
}

#[test]
fn exported_file_loads_back_with_global_indices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.beagleasset");

    let scene = Scene {
        meshes: vec![textured_triangle("a", 0.0, 0), textured_triangle("b", 1.0, 1)],
        materials: vec![
            Material {
                name: "red".into(),
                diffuse_texture: Some("red.png".into()),
            },
            Material {
                name: "blue".into(),
                diffuse_texture: Some("blue.png".into()),
            },
        ],
        root: Node::new("root")
            .with_meshes([0])
            .with_child(Node::new("child").with_meshes([1])),
    };

    let stats = export_to_path(&scene, &path, &ExportOptions::default()).unwrap();
    assert_eq!(stats.vertices, 6);
    assert_eq!(stats.textures, 2);

    let asset = load_asset_from_path(&path).unwrap();
    assert_eq!(asset.mesh.indices, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(asset.mesh.vertices[3].position, [0.0, 0.0, 1.0]);
    assert_eq!(asset.blocks.len(), 2);
    assert_eq!(asset.blocks[0].texture.as_deref(), Some("red.png"));
    assert_eq!(asset.texture_path(), Some("blue.png"));
    assert_eq!(
        asset.resolve_texture(dir.path()),
        Some(dir.path().join("blue.png"))
    );
}

#[test]
fn obj_on_disk_converts_and_resolves_its_texture() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("cube.obj"),
        "mtllib cube.mtl\n\
         v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
         vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
         usemtl skin\n\
         f 1/1 2/2 3/3 4/4\n",
    )
    .unwrap();
    fs::write(dir.path().join("cube.mtl"), "newmtl skin\nmap_Kd skin.png\n").unwrap();
    image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
        .save(dir.path().join("skin.png"))
        .unwrap();

    let scene = import_obj(&dir.path().join("cube.obj")).unwrap();
    let out = dir.path().join("cube.beagleasset");
    export_to_path(&scene, &out, &ExportOptions::default()).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().last(), Some("t:skin.png"));

    let asset = load_asset_from_path(&out).unwrap();
    assert_eq!(asset.mesh.triangle_count(), 2);
    let texture_path = asset.resolve_texture(dir.path()).unwrap();
    let texture = TextureData::load(texture_path).unwrap();
    assert_eq!((texture.width, texture.height), (4, 4));
    assert!(texture.is_valid());
}

#[test]
fn missing_asset_file_names_the_path() {
    let err = load_asset_from_path("no/such/file.beagleasset").unwrap_err();
    assert!(format!("{err:#}").contains("no/such/file.beagleasset"));
}

#[test]
fn malformed_asset_file_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.beagleasset");
    fs::write(&path, "v:0,0,0,0,0\nv:oops\n").unwrap();
    let err = load_asset_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
}
