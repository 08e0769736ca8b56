//! Shared fixtures for the unit tests: a tiny HTTP stub and synthetic NSRDB archives.

use async_compression::tokio::bufread::GzipEncoder;
use chrono::{Datelike, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const TITLE_ROW: &str =
    "YYYY-MM-DD,HH:MM (LST),Zenith (deg),Azimuth (deg),ETR (Wh/m^2),ETRN (Wh/m^2)";

pub struct StubServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    last_path: Arc<Mutex<Option<String>>>,
}

impl StubServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_path(&self) -> Option<String> {
        self.last_path.lock().unwrap().clone()
    }
}

/// Serves `body` with `status` for every request until the test ends.
pub async fn serve(status: u16, body: Vec<u8>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let last_path = Arc::new(Mutex::new(None));

    let (server_hits, server_path) = (hits.clone(), last_path.clone());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            let hits = server_hits.clone();
            let last_path = server_path.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).map(str::to_string);
                *last_path.lock().unwrap() = path;
                hits.fetch_add(1, Ordering::SeqCst);

                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    500 => "Internal Server Error",
                    _ => "Status",
                };
                let head = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    StubServer {
        base_url: format!("http://{addr}/"),
        hits,
        last_path,
    }
}

/// One year of hourly-sampled rows with a title line. `values` gets
/// `(year, date, hour)` and returns the ZENITH, AZIMUTH, ETR, ETRN cells.
pub fn year_csv<F>(year: i32, hours: &[u32], values: F) -> String
where
    F: Fn(i32, NaiveDate, u32) -> [String; 4],
{
    let mut csv = String::from(TITLE_ROW);
    csv.push('\n');
    let mut date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    while date.year() == year {
        for &hour in hours {
            let [zenith, azimuth, etr, etrn] = values(year, date, hour);
            csv.push_str(&format!(
                "{},{:02}:00,{},{},{},{}\n",
                date.format("%Y-%m-%d"),
                hour,
                zenith,
                azimuth,
                etr,
                etrn
            ));
        }
        date = date.succ_opt().unwrap();
    }
    csv
}

/// Packs `(path, contents)` entries into a gzip-compressed tar.
pub async fn tar_gz(entries: &[(String, String)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    let tar_bytes = builder.into_inner().unwrap();

    let mut encoder = GzipEncoder::new(&tar_bytes[..]);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await.unwrap();
    compressed
}

/// Values whose 3-year mean at 01-01 17:00 is
/// `ZENITH 88.6, AZIMUTH 237.0, ETR 11.6, ETRN 480.9`, mixing integer and
/// fractional cells. Other slots vary by day of year and hour.
pub fn mit_like_values(year: i32, date: NaiveDate, hour: u32) -> [String; 4] {
    let i = (year - 1995) as usize;
    if date.ordinal() == 1 && hour == 17 {
        let zenith = ["88.5", "88.6", "88.7"][i % 3];
        let azimuth = ["236", "237", "238"][i % 3];
        let etr = ["11", "11.9", "11.9"][i % 3];
        let etrn = ["480.9", "480.8", "481.0"][i % 3];
        return [zenith, azimuth, etr, etrn].map(str::to_string);
    }
    let base = date.ordinal() as f64 + hour as f64 / 100.0;
    [
        format!("{:.1}", 90.0 - base / 10.0),
        format!("{}", date.ordinal() + hour),
        format!("{}", hour * 10),
        format!("{:.1}", 1300.0 + base),
    ]
}

/// A complete station archive for `years`, in NSRDB layout.
pub async fn station_archive(station: &str, years: &[i32], hours: &[u32]) -> Vec<u8> {
    let entries: Vec<(String, String)> = years
        .iter()
        .map(|&year| {
            (
                format!("nsrdb_solar/{station}/{station}_{year}.csv"),
                year_csv(year, hours, mit_like_values),
            )
        })
        .collect();
    tar_gz(&entries).await
}
