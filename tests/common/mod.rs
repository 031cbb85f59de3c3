//! Shared utilities for integration testing.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use heicker::admission::AdmissionGate;
use heicker::codec::png::PngDecoder;
use heicker::observability::RequestCounter;
use heicker::{HttpServer, ServiceConfig, Shutdown};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Big-endian TIFF with one ASCII tag, small enough to eyeball in a dump.
pub const TIFF: &[u8] = b"MM\0*\0\0\0\x08\0\x01\x01\x0f\0\x02\0\0\0\x04ACME\0\0\0\0";

/// A service listening on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub gate: Arc<AdmissionGate>,
    pub counter: Arc<RequestCounter>,
    pub shutdown: Shutdown,
    _public: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server with a PNG source decoder and a throwaway static root.
pub async fn start_server(mut config: ServiceConfig, admission_timeout: Option<Duration>) -> TestServer {
    let public = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join("index.html"), "<form>heicker</form>").unwrap();
    std::fs::create_dir(public.path().join("css")).unwrap();
    std::fs::write(public.path().join("css").join("site.css"), "body {}").unwrap();
    config.static_files.serve_path = public.path().to_string_lossy().into_owned();

    let mut server = HttpServer::with_source(config, Arc::new(PngDecoder));
    if let Some(timeout) = admission_timeout {
        server = server.with_admission_timeout(timeout);
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let gate = server.gate();
    let counter = server.counter();
    let shutdown = Shutdown::new();

    tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        gate,
        counter,
        shutdown,
        _public: public,
    }
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// PNG test image, optionally carrying `tiff` in an `eXIf` chunk after IHDR.
pub fn png_with_exif(width: u32, height: u32, tiff: Option<&[u8]>) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let Some(tiff) = tiff else { return png };

    let mut body = b"eXIf".to_vec();
    body.extend_from_slice(tiff);
    let mut out = png[..33].to_vec();
    out.extend_from_slice(&(tiff.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc32(&body).to_be_bytes());
    out.extend_from_slice(&png[33..]);
    out
}

/// Multipart form with `infile` and, optionally, `outname`.
pub fn convert_form(bytes: Vec<u8>, file_name: &str, outname: Option<&str>) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
    let form = reqwest::multipart::Form::new()
        .part("infile", part)
        .text("submit", "Convert");
    match outname {
        Some(name) => form.text("outname", name.to_string()),
        None => form,
    }
}
