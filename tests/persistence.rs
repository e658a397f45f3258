use std::{fs::File, io::Write, path::Path};

use ndarray::{Array, Ix4};
use ndarray_rand::{
    rand::{rngs::StdRng, SeedableRng},
    rand_distr::Normal,
    RandomExt,
};
use visual_dna::{
    codec::{archive_path, ArchiveReader},
    gaussian::persist::read_layers,
    CodecConfig, Compression, DistError, GaussianDistribution, LayerFeatures,
    Metadata,
};

fn fitted(seed: u64, samples: usize) -> GaussianDistribution {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.5_f32, 2.0).unwrap();

    let conv = Array::<f32, Ix4>::random_using((samples, 4, 3, 3), normal, &mut rng).into_dyn();
    let fc = Array::<f32, _>::random_using((samples, 10), normal, &mut rng).into_dyn();

    let features = LayerFeatures::new()
        .with("block1.conv", conv.view())
        .unwrap()
        .with("head.fc", fc.view())
        .unwrap();

    GaussianDistribution::fit(&features)
        .unwrap()
        .with_extractor("vgg16")
}

fn assert_f32_round_trip(original: &GaussianDistribution, loaded: &GaussianDistribution) {
    assert_eq!(
        original.layer_names().collect::<Vec<_>>(),
        loaded.layer_names().collect::<Vec<_>>()
    );

    for layer in original.layer_names() {
        let (a, b) = (original.layer(layer).unwrap(), loaded.layer(layer).unwrap());
        for (x, y) in a.mu().iter().zip(b.mu()) {
            assert_eq!((*x as f32) as f64, *y);
        }
        for (x, y) in a.var().iter().zip(b.var()) {
            assert_eq!((*x as f32) as f64, *y);
        }
    }
}

#[test]
fn save_then_open_round_trips_to_f32_precision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shard");
    let dist = fitted(7, 16);

    dist.save(&path, &CodecConfig::default()).unwrap();
    assert!(path.with_extension("npz").exists());
    assert!(path.with_extension("json").exists());

    let loaded = GaussianDistribution::open(&path).unwrap();

    assert_eq!(loaded.sample_count(), 16);
    assert_eq!(loaded.extractor(), Some("vgg16"));
    assert_eq!(loaded.neuron_count("block1.conv"), Some(36));
    assert_f32_round_trip(&dist, &loaded);
}

#[test]
fn uncompressed_archives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain");
    let dist = fitted(3, 5);

    dist.save(&path, &CodecConfig::new(Compression::Stored, None))
        .unwrap();

    let loaded = GaussianDistribution::load(&path, &dist.metadata()).unwrap();
    assert_f32_round_trip(&dist, &loaded);
}

#[test]
fn archive_is_keyed_by_statistic_and_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys");
    fitted(1, 4).save(&path, &CodecConfig::default()).unwrap();

    let reader = ArchiveReader::open(&archive_path(&path)).unwrap();
    let mut keys = reader.keys();
    keys.sort();

    assert_eq!(
        keys,
        ["mu-block1.conv", "mu-head.fc", "var-block1.conv", "var-head.fc"]
    );
}

#[test]
fn read_layers_follows_the_requested_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order");
    fitted(2, 4).save(&path, &CodecConfig::default()).unwrap();

    let layers = read_layers(&path, &["head.fc", "block1.conv"]).unwrap();
    let names: Vec<_> = layers.iter().map(|(name, _)| name.as_str()).collect();

    assert_eq!(names, ["head.fc", "block1.conv"]);
    assert_eq!(layers[0].1.len(), 10);
}

#[test]
fn missing_layer_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing");
    fitted(4, 4).save(&path, &CodecConfig::default()).unwrap();

    let err = read_layers(&path, &["head.fc", "head.proj"]).unwrap_err();
    assert!(matches!(
        err,
        DistError::MissingLayer { ref layer, ref key } if layer == "head.proj" && key == "mu-head.proj"
    ));
}

#[test]
fn corrupt_archive_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt");
    let dist = fitted(5, 4);
    dist.save(&path, &CodecConfig::default()).unwrap();

    let archive = archive_path(&path);
    let bytes = std::fs::read(&archive).unwrap();
    File::create(&archive)
        .unwrap()
        .write_all(&bytes[..bytes.len() / 2])
        .unwrap();

    let err = GaussianDistribution::load(&path, &dist.metadata()).unwrap_err();
    assert!(matches!(err, DistError::Io(_)));
}

#[test]
fn missing_files_are_io_errors() {
    let path = Path::new("/nonexistent/visual-dna/shard");
    assert!(matches!(GaussianDistribution::open(path), Err(DistError::Io(_))));
    assert!(matches!(read_layers(path, &["x"]), Err(DistError::Io(_))));
}

#[test]
fn metadata_of_another_family_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hist");
    fitted(6, 4).save(&path, &CodecConfig::default()).unwrap();

    let meta_path = Metadata::path_for(&path);
    let raw = std::fs::read_to_string(&meta_path).unwrap();
    std::fs::write(&meta_path, raw.replace("\"gaussian\"", "\"histogram\"")).unwrap();

    assert!(matches!(
        GaussianDistribution::open(&path),
        Err(DistError::SchemaMismatch(_))
    ));

    let meta = Metadata::read(&path).unwrap();
    assert_eq!(meta.type_tag, "histogram");
    assert!(matches!(
        GaussianDistribution::load(&path, &meta),
        Err(DistError::SchemaMismatch(_))
    ));
}

#[test]
fn oversized_array_header_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hostile.npz");

    let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (4611686018427387905,), }\n";
    let mut npy = b"\x93NUMPY\x01\x00".to_vec();
    npy.extend_from_slice(&(header.len() as u16).to_le_bytes());
    npy.extend_from_slice(header.as_bytes());
    npy.extend_from_slice(&[0; 16]);

    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    zip.start_file("mu-L.npy", options).unwrap();
    zip.write_all(&npy).unwrap();
    zip.finish().unwrap();

    let err = read_layers(&path, &["L"]).unwrap_err();
    assert!(matches!(err, DistError::Io(ref e) if e.kind() == std::io::ErrorKind::InvalidData));
}

#[test]
fn empty_distribution_saves_and_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty");
    let empty = GaussianDistribution::new();

    empty.save(&path, &CodecConfig::default()).unwrap();
    let loaded = GaussianDistribution::open(&path).unwrap();

    assert_eq!(loaded, empty);
}
