use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    run()
}

#[cfg(feature = "camera-nokhwa")]
fn run() -> Result<()> {
    use camfx::{app, config::Config, detect::Detector, models};

    let config = Config::from_env();

    let paths = models::ModelPaths::default();
    models::ensure_models_available(&paths)?;

    let detector = if config.detection {
        Some(Detector::open(&paths, config.detector)?)
    } else {
        None
    };

    let (_control_tx, control_rx) = app::control_channel();
    app::run(&config, detector, control_rx)
}

#[cfg(not(feature = "camera-nokhwa"))]
fn run() -> Result<()> {
    anyhow::bail!("camfx was built without camera support; enable the camera-nokhwa feature")
}
