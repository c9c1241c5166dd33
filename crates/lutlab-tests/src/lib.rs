//! Integration tests for lutlab crates.
//!
//! End-to-end checks across the parser, image I/O, analysis, clustering
//! and snapshot layers.

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use lutlab_analysis::{FeatureDim, Thresholds, Tone};
    use lutlab_batch::{ApplyJob, BatchRunner, ItemOutcome};
    use lutlab_cluster::{
        ClusterAlgorithm, ClusterEngine, ClusterForest, ClusterParams, DistillMode, Linkage, Metric, NamePolicy,
        SnapshotStore,
    };
    use lutlab_core::ImageBuf;
    use lutlab_io::{PngDepth, png};
    use lutlab_lut::{Lattice, cube};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Lattice mapping every input to `tint` scaled by input brightness.
    /// The hue is the same at every entry.
    fn tinted(size: usize, tint: [f32; 3]) -> Lattice {
        let n = (size - 1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    let v = (r + g + b) as f32 / (3.0 * n);
                    let scale = 0.2 + 0.8 * v;
                    data.push(tint.map(|c| c * scale));
                }
            }
        }
        Lattice::from_data(data, size).unwrap()
    }

    fn write_luts(dir: &Path) -> Vec<PathBuf> {
        let luts = [
            ("warm-1", [1.0, 0.5, 0.2]),
            ("warm-2", [1.0, 0.45, 0.2]),
            ("cool-1", [0.2, 0.5, 1.0]),
            ("cool-2", [0.2, 0.45, 1.0]),
        ];
        luts.iter()
            .map(|(name, tint)| {
                let path = dir.join(format!("{name}.cube"));
                cube::write_3d(&path, &tinted(5, *tint).with_title(*name)).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_cube_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("identity.cube");
        let lattice = Lattice::identity(5).with_title("identity");

        cube::write_3d(&path, &lattice).unwrap();
        let parsed = cube::read_3d(&path).unwrap();

        assert!(parsed.warnings.is_empty());
        assert!(parsed.lattice.is_complete());
        assert_eq!(parsed.lattice.size(), 5);
        assert_eq!(parsed.lattice.title(), Some("identity"));
        assert_eq!(parsed.lattice.entries(), lattice.entries());
    }

    #[test]
    fn test_partial_cube_is_reported_not_rejected() {
        let parsed = cube::parse_str("LUT_3D_SIZE 2\n0 0 0\n1 0 0\n").unwrap();
        assert!(parsed.is_partial());
        assert!(!parsed.lattice.is_complete());
        assert_eq!(parsed.lattice.entries().len(), 2);
    }

    #[test]
    fn test_apply_pipeline_png() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("plate.png");
        let output = dir.path().join("graded/plate.png");

        let image = ImageBuf::from_u8(2, 2, 4, &[
            0, 0, 0, 255, //
            255, 0, 0, 128, //
            0, 255, 0, 64, //
            255, 255, 255, 0,
        ])
        .unwrap();
        png::write(&input, &image).unwrap();

        let invert = cube::parse_str("LUT_3D_SIZE 2\n1 1 1\n0 1 1\n1 0 1\n0 0 1\n1 1 0\n0 1 0\n1 0 0\n0 0 0\n")
            .unwrap()
            .lattice;
        lutlab_batch::apply_file(&input, &invert, &output).unwrap();

        let graded = png::read(&output).unwrap();
        assert_eq!(graded.channels, 4);
        assert_eq!(graded.to_u8(), vec![
            255, 255, 255, 255, //
            0, 255, 255, 128, //
            255, 0, 255, 64, //
            0, 0, 0, 0,
        ]);
    }

    #[test]
    fn test_apply_keeps_16_bit_depth() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("deep.png");
        let output = dir.path().join("deep_out.png");

        let image = ImageBuf::from_u16(2, 1, 3, &[0, 0, 0, 65535, 65535, 65535]).unwrap();
        png::write_with_depth(&input, &image, PngDepth::Sixteen).unwrap();

        lutlab_batch::apply_file(&input, &Lattice::identity(9), &output).unwrap();

        let graded = png::read_with_depth(&output).unwrap();
        assert_eq!(graded.depth, PngDepth::Sixteen);
        assert_eq!(graded.image, image);
    }

    #[test]
    fn test_batch_apply_with_missing_input() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.png");
        png::write(&good, &ImageBuf::from_u8(1, 1, 3, &[255, 0, 0]).unwrap()).unwrap();

        let lattice = Arc::new(Lattice::identity(2));
        let jobs: Vec<ApplyJob> = [good, dir.path().join("missing.png")]
            .into_iter()
            .map(|input| ApplyJob {
                output: dir.path().join("out").join(input.file_name().unwrap()),
                input,
                lattice: Arc::clone(&lattice),
            })
            .collect();

        let report = BatchRunner::new(Some(2)).unwrap().apply_batch(&jobs);
        assert_eq!(report.outcomes[0], ItemOutcome::Succeeded);
        assert!(matches!(report.outcomes[1], ItemOutcome::Failed(_)));
        assert_eq!(report.summary.processed, 2);
        assert!(dir.path().join("out/good.png").exists());
    }

    #[test]
    fn test_analyze_cluster_drill_distill_snapshot() {
        let dir = tempdir().unwrap();
        let files = write_luts(dir.path());

        // analysis
        let runner = BatchRunner::new(Some(2)).unwrap();
        let report = runner.analyze_batch(&files, &Thresholds::default());
        assert_eq!(report.summary.succeeded, 4);
        let analyses: Vec<_> = report.results.into_iter().flatten().collect();

        let warm = analyses.iter().find(|a| a.lut_id == "warm-1").unwrap();
        assert_relative_eq!(warm.features.h_mean, 22.5, epsilon = 1e-2);
        assert_relative_eq!(warm.features.s_mean, 0.8, epsilon = 1e-4);
        assert_eq!(warm.tags.tone, Tone::Warm);
        let cool = analyses.iter().find(|a| a.lut_id == "cool-1").unwrap();
        assert_relative_eq!(cool.features.h_mean, 217.5, epsilon = 1e-2);
        assert_eq!(cool.tags.tone, Tone::Cool);

        // clustering on hue
        let engine = ClusterEngine::new();
        for a in &analyses {
            engine.upsert_features(a.lut_id.clone(), a.features);
        }
        let params = ClusterParams {
            metric: Metric::new([FeatureDim::HMean]).unwrap(),
            k: 2,
            ..ClusterParams::default()
        };
        let run = engine.cluster(None, &params).unwrap();
        assert_eq!(run.parent_path, None);

        let warm_path = {
            let forest = engine.forest();
            let records = forest.run_records(run.run_id);
            let path_of = |id: &str| records.iter().find(|r| r.lut_id == id).unwrap().path.clone();
            // ids are clustered in sorted order, so the cool LUTs come first
            assert_eq!(path_of("cool-1"), "0");
            assert_eq!(path_of("cool-2"), "0");
            assert_eq!(path_of("warm-1"), "1");
            assert_eq!(path_of("warm-2"), "1");
            path_of("warm-1")
        };

        // drill into the warm cluster with a different algorithm
        let drill_params = ClusterParams {
            algorithm: ClusterAlgorithm::Agglomerative {
                linkage: Linkage::Average,
            },
            ..params.clone()
        };
        let child = engine.drill_down(run.tree_id, &warm_path, &drill_params).unwrap();
        assert_eq!(child.tree_id, run.tree_id);
        assert_eq!(child.level(), 1);
        {
            let forest = engine.forest();
            let children = forest.run_records(child.run_id);
            assert_eq!(children.len(), 2);
            for r in &children {
                assert!(r.path.starts_with("1-"));
                assert_eq!(r.level, 1);
                let parent = forest.record(r.parent.unwrap()).unwrap();
                assert_eq!(parent.lut_id, r.lut_id);
                assert_eq!(parent.path, warm_path);
            }
            assert!(forest.validate_hierarchy().is_ok());
        }
        assert!(engine.drill_down(run.tree_id, "7", &drill_params).is_err());

        // distill: every cluster keeps only its most central member
        let distilled = engine.distill(run.run_id, DistillMode::CenterRadius(1000.0)).unwrap();
        assert_eq!((distilled.kept, distilled.flagged), (2, 2));
        assert_eq!(engine.forest().visible(run.run_id).len(), 2);
        assert_eq!(engine.clear_distilled(run.run_id).unwrap(), 2);
        assert_eq!(engine.forest().visible(run.run_id).len(), 4);

        // snapshot into a directory store, reopened
        let snap_dir = dir.path().join("snapshots");
        let snapshot = engine.snapshot_of(run.run_id, "hue-split").unwrap();
        let id = SnapshotStore::open_dir(&snap_dir, NamePolicy::Unique)
            .unwrap()
            .commit(&snapshot)
            .unwrap();

        let store = SnapshotStore::open_dir(&snap_dir, NamePolicy::Unique).unwrap();
        let loaded = store.get(id).unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.n_clusters, 2);
        assert_eq!(loaded.membership[&0], vec!["cool-1", "cool-2"]);
        assert_eq!(loaded.cluster_of("warm-2"), Some(1));

        let again = engine.snapshot_of(run.run_id, "hue-split").unwrap();
        assert!(store.commit(&again).is_err());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_forest_file_roundtrip() {
        let dir = tempdir().unwrap();
        let files = write_luts(dir.path());
        let analyses: Vec<_> = files
            .iter()
            .map(|p| lutlab_batch::analyze_file(p, &Thresholds::default()).unwrap())
            .collect();

        let engine = ClusterEngine::new();
        for a in &analyses {
            engine.upsert_features(a.lut_id.clone(), a.features);
        }
        let run = engine.cluster(None, &ClusterParams::with_k(2)).unwrap();
        engine.drill_down(run.tree_id, "0", &ClusterParams::with_k(1)).unwrap();
        engine.distill(run.run_id, DistillMode::Pairwise(0.0)).unwrap();

        let path = dir.path().join("forest.json");
        engine.forest().save(&path).unwrap();
        let loaded = ClusterForest::load(&path).unwrap();
        assert_eq!(loaded, *engine.forest());

        // a reopened engine keeps allocating fresh ids
        let reopened = ClusterEngine::with_forest(loaded);
        for a in &analyses {
            reopened.upsert_features(a.lut_id.clone(), a.features);
        }
        let second = reopened.cluster(None, &ClusterParams::with_k(2)).unwrap();
        assert_ne!(second.tree_id, run.tree_id);
        assert_eq!(reopened.forest().tree_ids().len(), 2);

        let json = serde_json::to_string(&*reopened.forest()).unwrap();
        let imported = ClusterEngine::new();
        imported.import_json(&json).unwrap();
        assert_eq!(*imported.forest(), *reopened.forest());
    }

    #[test]
    fn test_same_inputs_same_clusters() {
        let dir = tempdir().unwrap();
        let files = write_luts(dir.path());
        let labels = || {
            let engine = ClusterEngine::new();
            for p in &files {
                let a = lutlab_batch::analyze_file(p, &Thresholds::default()).unwrap();
                engine.upsert_features(a.lut_id, a.features);
            }
            let params = ClusterParams {
                seed: 7,
                ..ClusterParams::with_k(3)
            };
            let run = engine.cluster(None, &params).unwrap();
            let forest = engine.forest();
            forest
                .run_records(run.run_id)
                .iter()
                .map(|r| (r.lut_id.clone(), r.cluster_id, r.distance_to_center))
                .collect::<Vec<_>>()
        };
        assert_eq!(labels(), labels());
    }
}
