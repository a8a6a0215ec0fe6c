//! Font provisioning for CJK chart text
//!
//! The chart font is a local TrueType file. Depending on [`FontPolicy`] a
//! missing file is either downloaded or reported as a blocking error.
//! Provisioning never touches global state: it yields a [`ChartTheme`] that the
//! renderer receives explicitly.

use crate::config::{FontPolicy, FontSettings};
use crate::error::{Result, StockError};
use crate::status::Banner;
use futures::StreamExt;
use lens_prompt::Language;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

const MINUS_SIGN: char = '\u{2212}';

/// Whether `bytes` start like a TrueType/OpenType font or collection
pub fn looks_like_font(bytes: &[u8]) -> bool {
    [&[0x00, 0x01, 0x00, 0x00][..], b"true", b"OTTO", b"ttcf"]
        .iter()
        .any(|magic| bytes.starts_with(magic))
}

/// Text settings the chart renderer is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartTheme {
    font: Option<(String, Vec<u8>)>,
    ascii_minus: bool,
}

impl ChartTheme {
    /// Built-in fonts only
    pub fn builtin(ascii_minus: bool) -> Self {
        Self {
            font: None,
            ascii_minus,
        }
    }

    /// Use `bytes` as the primary font, registered as `family`
    pub fn with_font(family: impl Into<String>, bytes: Vec<u8>, ascii_minus: bool) -> Self {
        Self {
            font: Some((family.into(), bytes)),
            ascii_minus,
        }
    }

    pub fn has_custom_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font.as_ref().map(|(family, _)| family.as_str())
    }

    pub fn font_bytes(&self) -> Option<&[u8]> {
        self.font.as_ref().map(|(_, bytes)| bytes.as_slice())
    }

    pub fn ascii_minus(&self) -> bool {
        self.ascii_minus
    }

    /// Format a tick value with `decimals` places and the theme's minus sign
    pub fn format_number(&self, value: f64, decimals: usize) -> String {
        let text = format!("{value:.decimals$}");
        if self.ascii_minus {
            text
        } else {
            text.replacen('-', &MINUS_SIGN.to_string(), 1)
        }
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::builtin(true)
    }
}

/// Result of [`FontProvisioner::provision`]
#[derive(Debug, Clone)]
pub struct FontProvision {
    pub theme: ChartTheme,
    pub banners: Vec<Banner>,
    /// No analysis may run until the font is placed by hand
    pub halted: bool,
}

/// What [`FontProvisioner::ensure_font`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStatus {
    AlreadyPresent,
    Downloaded { bytes: u64 },
}

/// Makes sure the chart font exists and loads it
pub struct FontProvisioner {
    client: reqwest::Client,
    settings: FontSettings,
}

impl FontProvisioner {
    pub fn new(settings: FontSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, settings })
    }

    /// Make the font available on disk according to the policy
    pub async fn ensure_font(&self) -> Result<FontStatus> {
        let path = &self.settings.path;
        if tokio::fs::try_exists(path).await? {
            debug!("Font already present at {}", path.display());
            return Ok(FontStatus::AlreadyPresent);
        }

        match &self.settings.policy {
            FontPolicy::Download { url } => {
                let bytes = self.download(url, path).await?;
                Ok(FontStatus::Downloaded { bytes })
            }
            FontPolicy::RequireLocal { hint } => Err(StockError::FontError(format!(
                "font file '{}' not found; {hint}",
                path.display()
            ))),
        }
    }

    /// Stream `url` to `path` chunk by chunk
    ///
    /// Data lands in a sibling `.part` file that is renamed once complete, so an
    /// interrupted download never leaves a truncated font at `path`.
    #[instrument(skip(self))]
    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let partial = partial_path(path);
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut stream = response.bytes_stream();
        let mut head = Vec::with_capacity(4);
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&partial).await;
                    return Err(e.into());
                }
            };
            if head.len() < 4 {
                head.extend(chunk.iter().take(4 - head.len()));
            }
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        if !looks_like_font(&head) {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(StockError::FontError(format!(
                "download from {url} is not a TrueType/OpenType font"
            )));
        }

        tokio::fs::rename(&partial, path).await?;
        info!("Downloaded font ({} bytes) to {}", written, path.display());
        Ok(written)
    }

    /// Read the font file into a theme
    pub async fn load_theme(&self) -> Result<ChartTheme> {
        let bytes = tokio::fs::read(&self.settings.path).await?;
        if !looks_like_font(&bytes) {
            return Err(StockError::FontError(format!(
                "'{}' is not a TrueType/OpenType font",
                self.settings.path.display()
            )));
        }
        Ok(ChartTheme::with_font(
            self.settings.family.clone(),
            bytes,
            self.settings.ascii_minus,
        ))
    }

    /// Ensure and load the font, reporting progress as banners
    ///
    /// Failures degrade to the built-in fonts, except a missing file under
    /// [`FontPolicy::RequireLocal`], which halts the dashboard.
    pub async fn provision(&self, language: &Language) -> FontProvision {
        let mut banners = Vec::new();
        let degraded = ChartTheme::builtin(self.settings.ascii_minus);
        let present = tokio::fs::try_exists(&self.settings.path)
            .await
            .unwrap_or(false);

        if !present {
            if let FontPolicy::Download { .. } = self.settings.policy {
                banners.push(Banner::info(language.pick(
                    "Chinese font is missing; downloading Taipei Sans TC so chart text renders correctly.",
                    "偵測到缺少中文字體，正在下載「台北思源黑體」以正確顯示中文。",
                )));
            }

            match self.ensure_font().await {
                Ok(_) if matches!(self.settings.policy, FontPolicy::Download { .. }) => {
                    banners.push(Banner::success(
                        language.pick("Font downloaded!", "字體下載完成！"),
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    let halted = matches!(self.settings.policy, FontPolicy::RequireLocal { .. });
                    warn!("Font provisioning failed: {}", e);
                    banners.push(Banner::error(match language {
                        Language::TraditionalChinese if halted => {
                            format!("找不到中文字體：{e}。請放置字體檔後重新啟動。")
                        }
                        Language::TraditionalChinese => {
                            format!("下載字體失敗：{e}。中文可能無法正常顯示。")
                        }
                        _ if halted => {
                            format!("Chinese font not found: {e}. Place the file and restart.")
                        }
                        _ => format!(
                            "Font download failed: {e}. Chinese text may not render correctly."
                        ),
                    }));
                    return FontProvision {
                        theme: degraded,
                        banners,
                        halted,
                    };
                }
            }
        }

        let theme = match self.load_theme().await {
            Ok(theme) => theme,
            Err(e) => {
                warn!("Font setup failed: {}", e);
                banners.push(Banner::error(match language {
                    Language::TraditionalChinese => {
                        format!("設定中文字體失敗：{e}。中文可能無法正常顯示。")
                    }
                    _ => format!("Font setup failed: {e}. Chinese text may not render correctly."),
                }));
                degraded
            }
        };

        FontProvision {
            theme,
            banners,
            halted: false,
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::BannerLevel;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const FAKE_TTF: &[u8] = &[0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x01, 0x00];

    fn settings(path: PathBuf, policy: FontPolicy) -> FontSettings {
        FontSettings {
            path,
            policy,
            ..FontSettings::default()
        }
    }

    /// Serve `body` to a single HTTP request and return its URL
    async fn serve_once(body: &'static [u8], content_type: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/TaipeiSansTCBeta-Regular.ttf")
    }

    fn download_policy(url: String) -> FontPolicy {
        FontPolicy::Download { url }
    }

    #[test]
    fn test_looks_like_font() {
        assert!(looks_like_font(FAKE_TTF));
        assert!(looks_like_font(b"OTTO rest"));
        assert!(looks_like_font(b"ttcf"));
        assert!(!looks_like_font(b"<!DOCTYPE html>"));
        assert!(!looks_like_font(b"ab"));
    }

    #[test]
    fn test_format_number_minus_sign() {
        assert_eq!(ChartTheme::builtin(true).format_number(-1.5, 2), "-1.50");
        assert_eq!(ChartTheme::builtin(false).format_number(-1.5, 2), "\u{2212}1.50");
        assert_eq!(ChartTheme::builtin(false).format_number(70.0, 0), "70");
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("fonts/Taipei.ttf")),
            PathBuf::from("fonts/Taipei.ttf.part")
        );
    }

    #[tokio::test]
    async fn test_existing_font_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, FAKE_TTF).unwrap();

        let provisioner =
            FontProvisioner::new(settings(path, FontPolicy::default()), Duration::from_secs(1))
                .unwrap();
        assert_eq!(provisioner.ensure_font().await.unwrap(), FontStatus::AlreadyPresent);

        let provision = provisioner.provision(&Language::English).await;
        assert!(provision.banners.is_empty());
        assert!(!provision.halted);
        assert_eq!(provision.theme.font_family(), Some("Taipei Sans TC Beta"));
        assert_eq!(provision.theme.font_bytes(), Some(FAKE_TTF));
    }

    #[tokio::test]
    async fn test_require_local_halts() {
        let dir = tempdir().unwrap();
        let policy = FontPolicy::RequireLocal {
            hint: "download it from the project page".to_string(),
        };
        let provisioner =
            FontProvisioner::new(settings(dir.path().join("absent.ttf"), policy), Duration::from_secs(1))
                .unwrap();

        let provision = provisioner.provision(&Language::English).await;
        assert!(provision.halted);
        assert_eq!(provision.banners.len(), 1);
        assert_eq!(provision.banners[0].level, BannerLevel::Error);
        assert!(provision.banners[0].text.contains("download it from the project page"));
        assert!(!provision.theme.has_custom_font());
    }

    #[tokio::test]
    async fn test_failed_download_degrades() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        let policy = FontPolicy::Download {
            url: "http://127.0.0.1:9/font.ttf".to_string(),
        };
        let provisioner =
            FontProvisioner::new(settings(path.clone(), policy), Duration::from_secs(2)).unwrap();

        let provision = provisioner.provision(&Language::TraditionalChinese).await;
        assert!(!provision.halted);
        assert!(!provision.theme.has_custom_font());
        assert_eq!(provision.banners.first().unwrap().level, BannerLevel::Info);
        assert_eq!(provision.banners.last().unwrap().level, BannerLevel::Error);
        assert!(provision.banners.last().unwrap().text.starts_with("下載字體失敗"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_invalid_font_file_degrades() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, b"<html>quota exceeded</html>").unwrap();

        let provisioner =
            FontProvisioner::new(settings(path, FontPolicy::default()), Duration::from_secs(1))
                .unwrap();
        let provision = provisioner.provision(&Language::English).await;

        assert!(!provision.halted);
        assert_eq!(provision.banners.len(), 1);
        assert!(provision.banners[0].text.starts_with("Font setup failed"));
        assert!(!provision.theme.has_custom_font());
    }

    #[tokio::test]
    async fn test_download_writes_font() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fonts").join("font.ttf");
        let url = serve_once(FAKE_TTF, "application/octet-stream").await;
        let provisioner =
            FontProvisioner::new(settings(path.clone(), download_policy(url)), Duration::from_secs(5))
                .unwrap();

        let status = provisioner.ensure_font().await.unwrap();
        assert_eq!(status, FontStatus::Downloaded { bytes: FAKE_TTF.len() as u64 });
        assert_eq!(std::fs::read(&path).unwrap(), FAKE_TTF);
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_provision_downloads_and_loads_font() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        let url = serve_once(FAKE_TTF, "application/octet-stream").await;
        let provisioner =
            FontProvisioner::new(settings(path.clone(), download_policy(url)), Duration::from_secs(5))
                .unwrap();

        let provision = provisioner.provision(&Language::English).await;
        assert!(!provision.halted);
        assert_eq!(provision.banners.len(), 2);
        assert_eq!(provision.banners[0].level, BannerLevel::Info);
        assert_eq!(provision.banners[1].level, BannerLevel::Success);
        assert_eq!(provision.banners[1].text, "Font downloaded!");
        assert_eq!(provision.theme.font_bytes(), Some(FAKE_TTF));
        assert!(path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_html_download_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        let url = serve_once(b"<!DOCTYPE html><p>Quota exceeded</p>", "text/html").await;
        let provisioner =
            FontProvisioner::new(settings(path.clone(), download_policy(url)), Duration::from_secs(5))
                .unwrap();

        let result = provisioner.ensure_font().await;
        assert!(matches!(result, Err(StockError::FontError(_))));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }
}
