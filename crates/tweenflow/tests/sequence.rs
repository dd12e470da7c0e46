use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tweenflow::{
    flow::{RemapResampler, ZeroMotion},
    image::Image,
    imgproc::parallel::ExecutionStrategy,
    run, FsStorage, InterpolationConfig, InterpolationError, Interpolator, MemoryStorage,
    PathTemplate, RunConfig,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn uniform(value: u8) -> Result<Image<u8, 3>, InterpolationError> {
    Ok(Image::from_size_val([12, 9].into(), value)?)
}

fn uniform_value(frame: Option<Image<u8, 3>>) -> Option<u8> {
    let frame = frame?;
    let first = *frame.as_slice().first()?;
    frame.as_slice().iter().all(|&v| v == first).then_some(first)
}

#[test]
fn run_doubles_frame_rate() -> Result<(), InterpolationError> {
    init_logger();

    let template = PathTemplate::parse("clip/img_%03d.png")?;
    let storage = MemoryStorage::<u8, 3>::new();
    storage.insert(template.path_for(0), uniform(10)?);
    storage.insert(template.path_for(1), uniform(20)?);

    let config = RunConfig {
        images: template.to_string(),
        n_images: 2,
        factor: 2,
        ..Default::default()
    };
    let summary = run::<u8, 3, _>(&config, &storage, CancellationToken::new())?;

    assert_eq!(summary.renamed, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(storage.len(), 3);
    assert_eq!(uniform_value(storage.get(template.path_for(0))), Some(10));
    assert_eq!(uniform_value(storage.get(template.path_for(1))), Some(15));
    assert_eq!(uniform_value(storage.get(template.path_for(2))), Some(20));
    Ok(())
}

#[test]
fn run_factor_four_rounds_half_away_from_zero() -> Result<(), InterpolationError> {
    init_logger();

    let template = PathTemplate::parse("img_%02d.png")?;
    let storage = MemoryStorage::<u8, 3>::new();
    for (index, value) in [(0, 10), (1, 20), (2, 30)] {
        storage.insert(template.path_for(index), uniform(value)?);
    }

    let config = RunConfig {
        images: template.to_string(),
        n_images: 3,
        factor: 4,
        strategy: ExecutionStrategy::Fixed(2),
        ..Default::default()
    };
    let summary = run::<u8, 3, _>(&config, &storage, CancellationToken::new())?;
    assert_eq!(summary.renamed, 2);
    assert_eq!(summary.written, 6);

    let values = (0..=8)
        .map(|k| uniform_value(storage.get(template.path_for(k))))
        .collect::<Vec<_>>();
    let expected = [10, 13, 15, 18, 20, 23, 25, 28, 30].map(Some).to_vec();
    assert_eq!(values, expected);
    Ok(())
}

#[test]
fn uneven_keyframes_write_nothing() -> Result<(), InterpolationError> {
    let template = PathTemplate::parse("img_%03d.png")?;
    let storage = MemoryStorage::<u8, 3>::new();
    storage.insert(template.path_for(0), uniform(10)?);
    storage.insert(template.path_for(3), uniform(40)?);

    let interpolator = Interpolator::new(
        ZeroMotion,
        RemapResampler::default(),
        &storage,
        template,
        InterpolationConfig {
            factor: 2,
            ..Default::default()
        },
    )?;

    let res = interpolator.interpolate_keyframes::<u8, 3>(&[0, 3]);
    assert!(matches!(
        res,
        Err(InterpolationError::InvalidFactor { factor: 2, gap: 3 })
    ));
    assert_eq!(storage.len(), 2);
    Ok(())
}

#[test]
fn malformed_template_touches_nothing() -> Result<(), InterpolationError> {
    let storage = MemoryStorage::<u8, 3>::new();
    storage.insert("img_000.png", uniform(10)?);
    storage.insert("img_001.png", uniform(20)?);

    let config = RunConfig {
        images: "img_%03d_%d.png".to_string(),
        ..Default::default()
    };
    let res = run::<u8, 3, _>(&config, &storage, CancellationToken::new());
    assert!(matches!(
        res,
        Err(InterpolationError::MalformedTemplate { .. })
    ));
    let untouched: Vec<PathBuf> = vec!["img_000.png".into(), "img_001.png".into()];
    assert_eq!(storage.paths(), untouched);
    Ok(())
}

#[test]
fn cancelled_run_renames_nothing() -> Result<(), InterpolationError> {
    let template = PathTemplate::parse("img_%03d.png")?;
    let storage = MemoryStorage::<u8, 3>::new();
    storage.insert(template.path_for(0), uniform(10)?);
    storage.insert(template.path_for(1), uniform(20)?);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = RunConfig {
        images: template.to_string(),
        ..Default::default()
    };
    let res = run::<u8, 3, _>(&config, &storage, cancel);
    assert!(matches!(res, Err(InterpolationError::Cancelled)));
    assert!(storage.get(template.path_for(1)).is_some());
    assert!(storage.get(template.path_for(2)).is_none());
    Ok(())
}

#[test]
fn run_on_files() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let tmp_dir = tempfile::tempdir()?;
    let images = format!("{}/img_%03d.png", tmp_dir.path().display());
    let template = PathTemplate::parse(&images)?;

    let storage = FsStorage::<u8, 3>::new();
    for (index, value) in [(0, 0), (1, 100), (2, 200)] {
        let frame = Image::<u8, 3>::from_size_val([16, 12].into(), value)?;
        tweenflow::io::functional::write_image_any(template.path_for(index), &frame)?;
    }

    let config = RunConfig {
        images,
        n_images: 3,
        factor: 2,
        strategy: ExecutionStrategy::Serial,
        ..Default::default()
    };
    let summary = run::<u8, 3, _>(&config, storage, CancellationToken::new())?;
    assert_eq!(summary.renamed, 2);
    assert_eq!(summary.written, 2);

    for (index, value) in [(0, 0u8), (1, 50), (2, 100), (3, 150), (4, 200)] {
        let frame: Image<u8, 3> =
            tweenflow::io::functional::read_image_any(template.path_for(index))?;
        assert!(frame.as_slice().iter().all(|&v| v == value), "frame {index}");
    }
    assert!(!template.path_for(5).exists());
    Ok(())
}

#[test]
fn mixed_channel_layouts_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let tmp_dir = tempfile::tempdir()?;
    let images = format!("{}/img_%03d.png", tmp_dir.path().display());
    let template = PathTemplate::parse(&images)?;

    let rgb = Image::<u8, 3>::from_size_val([8, 6].into(), 10)?;
    let gray = Image::<u8, 1>::from_size_val([8, 6].into(), 20)?;
    tweenflow::io::functional::write_image_any(template.path_for(0), &rgb)?;
    tweenflow::io::functional::write_image_any(template.path_for(1), &gray)?;

    let config = RunConfig {
        images,
        strategy: ExecutionStrategy::Serial,
        ..Default::default()
    };
    let res = run::<u8, 3, _>(&config, FsStorage::<u8, 3>::new(), CancellationToken::new());

    // the gray frame was renumbered to 2 and refused when loaded
    match res {
        Err(InterpolationError::DimensionMismatch {
            index: 2,
            expected,
            found,
        }) => {
            assert_eq!(expected.channels, 3);
            assert_eq!(found.channels, 1);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!template.path_for(1).exists());
    Ok(())
}

#[test]
fn sample_depth_must_match() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let tmp_dir = tempfile::tempdir()?;
    let images = format!("{}/img_%03d.png", tmp_dir.path().display());
    let template = PathTemplate::parse(&images)?;

    for (index, value) in [(0, 1000u16), (1, 3001)] {
        let frame = Image::<u16, 3>::from_size_val([8, 6].into(), value)?;
        tweenflow::io::functional::write_image_any(template.path_for(index), &frame)?;
    }

    let config = RunConfig {
        images: images.clone(),
        strategy: ExecutionStrategy::Serial,
        ..Default::default()
    };
    let res = run::<u8, 3, _>(&config, FsStorage::<u8, 3>::new(), CancellationToken::new());
    assert!(matches!(
        res,
        Err(InterpolationError::DimensionMismatch { index: 0, found, .. }) if found.bit_depth == 16
    ));
    assert!(!template.path_for(1).exists());

    // the originals already sit at 0 and 2, read them at their own depth
    let layout = tweenflow::io::functional::read_image_layout(template.path_for(0))?;
    assert_eq!(layout.bit_depth, 16);

    let config = RunConfig {
        images,
        rename: false,
        strategy: ExecutionStrategy::Serial,
        ..Default::default()
    };
    let summary = run::<u16, 3, _>(&config, FsStorage::<u16, 3>::new(), CancellationToken::new())?;
    assert_eq!(summary.written, 1);

    let middle: Image<u16, 3> = tweenflow::io::functional::read_image_any(template.path_for(1))?;
    assert!(middle.as_slice().iter().all(|&v| v == 2001));
    Ok(())
}
