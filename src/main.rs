use road_guard::analysis::{self, ErrorPayload};
use road_guard::application::port::{DetectorError, PotholeDetector};
use road_guard::config;
use road_guard::error::{Error, Result};
use road_guard::infrastructure::onnx::OnnxPotholeDetector;
use road_guard::media::detector::{
    self, DetectorManager, DEFAULT_CONFIDENCE_THRESHOLD,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const USAGE: &str = "Usage: road-guard [--model PATH] [--threshold FLOAT] [--pretty] <image path or URL>";

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return;
    }

    let model: Option<PathBuf> = args.opt_value_from_str("--model").unwrap();
    let threshold: Option<f32> = args.opt_value_from_str("--threshold").unwrap();
    let pretty = args.contains("--pretty");
    let source = args
        .finish()
        .into_iter()
        .next()
        .and_then(|s| s.into_string().ok());

    let Some(source) = source else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    match run(&source, model, threshold, pretty).await {
        Ok(json) => println!("{json}"),
        Err(err) => {
            // Upstream failures produce the error document, not the report.
            let payload = ErrorPayload::new(&err);
            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| format!("{{\"error\":\"{err}\"}}"));
            eprintln!("{json}");
            std::process::exit(1);
        }
    }
}

async fn run(
    source: &str,
    model_override: Option<PathBuf>,
    threshold_override: Option<f32>,
    pretty: bool,
) -> Result<String> {
    let config = config::load().unwrap_or_default();
    let model_path = model_override
        .or(config.model_path)
        .unwrap_or_else(detector::default_model_path);
    let threshold = threshold_override
        .or(config.confidence_threshold)
        .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);

    let bytes = fetch_image(source).await?;
    let image = image_rs::load_from_memory(&bytes)?;

    let mut manager =
        DetectorManager::with_model_path(model_path).with_confidence_threshold(threshold);

    let mut freshly_downloaded = false;
    if !manager.is_model_downloaded() {
        if let Some(url) = config.model_url.as_deref() {
            log::info!("detection model missing, downloading from {url}");
            let path = manager.model_path().clone();
            detector::download_model(url, &path, |progress| {
                log::debug!("model download {:.0}%", progress * 100.0);
            })
            .await
            .map_err(|e| Error::Detector(DetectorError::ModelLoadFailed(e.to_string())))?;
            freshly_downloaded = true;
        }
    }

    if let Some(expected) = config.model_checksum.as_deref() {
        detector::verify_checksum(manager.model_path(), expected)
            .map_err(|e| Error::Detector(DetectorError::ModelLoadFailed(e.to_string())))?;
        log::debug!("model checksum verified");
    }

    let detector = OnnxPotholeDetector::from_manager(Arc::new(Mutex::new(manager)));
    detector.load()?;

    if freshly_downloaded {
        let mut manager = detector.manager().lock().map_err(|_| {
            Error::Detector(DetectorError::InferenceFailed("Lock poisoned".to_string()))
        })?;
        detector::validate_model(&mut manager)
            .map_err(|e| Error::Detector(DetectorError::InferenceFailed(e.to_string())))?;
        log::info!("downloaded model passed its validation inference");
    }

    let pothole_detected = detector.detect(&image)?;
    log::info!("detector verdict for {source}: pothole_detected={pothole_detected}");

    let analysis = analysis::analyze(&bytes, pothole_detected);
    let json = if pretty {
        serde_json::to_string_pretty(&analysis.report)?
    } else {
        serde_json::to_string(&analysis.report)?
    };
    Ok(json)
}

/// Reads the image bytes from a local path or an http(s) URL.
async fn fetch_image(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::get(source)
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "Failed to download image: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    } else {
        Ok(std::fs::read(source)?)
    }
}
