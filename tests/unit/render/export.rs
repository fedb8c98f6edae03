use std::path::Path;
use std::sync::{Arc, Mutex};

use super::*;
use crate::{
    animation::interp::InterpolationCurve,
    assets::store::PreparedImage,
    model::object::Placement,
    model::project::{ProjectSettings, ResourceId},
    model::transform::{Pose, Transformation},
};
use kurbo::Vec2;

fn sliding_project(frames: u32) -> (Project, ImageStore) {
    let mut p = Project::new(
        ProjectSettings {
            width: 16,
            height: 8,
            dpi: 100,
            lpi: 40.0,
            frames,
        },
        1,
    )
    .unwrap();
    let res = p.add_image("dot.png").unwrap();
    let id = p
        .place_object(
            Placement {
                layer: 0,
                column: 0,
                length: frames,
            },
            res,
            Pose::at(0.0, 0.0),
        )
        .unwrap();
    p.object_mut(id).unwrap().set_transformation(Transformation::translation(
        Vec2::new(8.0, 0.0),
        InterpolationCurve::Linear,
    ));

    let mut store = ImageStore::default();
    store.insert(
        res,
        PreparedImage {
            width: 2,
            height: 2,
            rgba8_premul: Arc::new([0u8, 0, 255, 255].repeat(4)),
        },
    );
    (p, store)
}

fn opts(dir: &Path, ext: &str) -> ExportOpts {
    ExportOpts::new(dir.join(format!("frame_%i.{ext}")).to_string_lossy().into_owned())
}

#[test]
fn output_path_substitutes_one_based_frame_number() {
    assert_eq!(
        frame_output_path("out/f_%i.png", FrameIndex(0)),
        PathBuf::from("out/f_1.png")
    );
    assert_eq!(
        frame_output_path("%i/%i.jpg", FrameIndex(9)),
        PathBuf::from("10/10.jpg")
    );
}

#[test]
fn options_are_validated() {
    let mut o = ExportOpts::new("frame.png");
    assert!(matches!(o.validate(), Err(LenticularError::Validation(_))));
    o.pattern = "f_%i.png".into();
    assert!(o.validate().is_ok());
    o.quality = 0;
    assert!(o.validate().is_err());
    o.quality = 101;
    assert!(o.validate().is_err());
    o.quality = 100;
    o.threading.threads = Some(0);
    assert!(o.validate().is_err());
}

#[test]
fn sequential_export_writes_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let (p, store) = sliding_project(3);
    let stats = export_project(&p, &store, &opts(dir.path(), "png")).unwrap();
    assert_eq!(
        stats,
        ExportStats {
            frames_written: 3,
            objects_drawn: 3,
        }
    );

    let first = image::open(dir.path().join("frame_1.png")).unwrap().to_rgba8();
    let last = image::open(dir.path().join("frame_3.png")).unwrap().to_rgba8();
    assert_eq!(first.dimensions(), (16, 8));
    assert_eq!(first.get_pixel(0, 0).0, [0, 0, 255, 255]);
    assert_eq!(first.get_pixel(8, 0).0[3], 0);
    assert_eq!(last.get_pixel(8, 0).0, [0, 0, 255, 255]);
    assert_eq!(last.get_pixel(0, 0).0[3], 0);
}

#[test]
fn parallel_export_matches_sequential_output() {
    let seq_dir = tempfile::tempdir().unwrap();
    let par_dir = tempfile::tempdir().unwrap();
    let (p, store) = sliding_project(6);

    export_project(&p, &store, &opts(seq_dir.path(), "png")).unwrap();
    let mut par = opts(par_dir.path(), "png");
    par.threading = ExportThreading {
        parallel: true,
        threads: Some(3),
    };
    let stats = export_project(&p, &store, &par).unwrap();
    assert_eq!(stats.frames_written, 6);

    for n in 1..=6 {
        let name = format!("frame_{n}.png");
        let a = image::open(seq_dir.path().join(&name)).unwrap().to_rgba8();
        let b = image::open(par_dir.path().join(&name)).unwrap().to_rgba8();
        assert_eq!(a, b, "{name}");
    }
}

#[test]
fn jpeg_export_honours_quality_range() {
    let dir = tempfile::tempdir().unwrap();
    let (p, store) = sliding_project(2);
    let mut o = opts(dir.path(), "jpg");
    o.quality = 40;
    export_project(&p, &store, &o).unwrap();
    assert!(dir.path().join("frame_1.jpg").is_file());
    assert!(dir.path().join("frame_2.jpg").is_file());
}

struct FailingAt {
    frame: u32,
    exported: Arc<Mutex<Vec<std::path::PathBuf>>>,
    current: u32,
}

impl Rasterizer for FailingAt {
    fn init_canvas(&mut self, _w: u32, _h: u32) -> LenticularResult<()> {
        Ok(())
    }
    fn load_image(&mut self, _r: ResourceId) -> LenticularResult<()> {
        Ok(())
    }
    fn resize(&mut self, _w: u32, _h: u32) -> LenticularResult<()> {
        Ok(())
    }
    fn rotate(&mut self, _a: f64) -> LenticularResult<()> {
        Ok(())
    }
    fn composite(&mut self, _x: f64, _y: f64) -> LenticularResult<()> {
        Ok(())
    }
    fn finalize(&mut self) -> LenticularResult<()> {
        Ok(())
    }
    fn export_canvas(&mut self, path: &Path, _q: u8) -> LenticularResult<()> {
        self.current += 1;
        if self.current == self.frame {
            return Err(LenticularError::render("disk full"));
        }
        self.exported.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[test]
fn first_failure_stops_sequential_export() {
    let (p, store) = sliding_project(5);
    let exported = Arc::new(Mutex::new(Vec::new()));
    let o = ExportOpts::new("f_%i.png");
    let err = export_frames(&p, &store, &o, || FailingAt {
        frame: 3,
        exported: exported.clone(),
        current: 0,
    })
    .unwrap_err();
    assert!(matches!(err, LenticularError::Render(_)));
    assert_eq!(
        *exported.lock().unwrap(),
        vec![PathBuf::from("f_1.png"), PathBuf::from("f_2.png")]
    );
}
