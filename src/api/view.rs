use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::services::upload_service::{UploadError, UploadResult};
use axum::response::Html;
use minijinja::{Environment, context};
use serde::Serialize;

const INDEX_TEMPLATE: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    /// Anything other than `error` renders as a success banner
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("error") => BannerKind::Error,
            _ => BannerKind::Success,
        }
    }
}

/// Message box rendered above the upload form
#[derive(Debug, Clone, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub upload: Option<UploadResult>,
}

impl Banner {
    pub fn notice(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            upload: None,
        }
    }

    pub fn uploaded(result: UploadResult) -> Self {
        Self {
            kind: BannerKind::Success,
            message: "File uploaded successfully!".to_string(),
            upload: Some(result),
        }
    }

    pub fn failed(err: &UploadError) -> Self {
        Self::notice(BannerKind::Error, err.to_string())
    }
}

impl From<Result<UploadResult, UploadError>> for Banner {
    fn from(outcome: Result<UploadResult, UploadError>) -> Self {
        match outcome {
            Ok(result) => Banner::uploaded(result),
            Err(e) => Banner::failed(&e),
        }
    }
}

/// Renders the upload page. Templates named `*.html` are auto-escaped.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, include_str!("../../templates/index.html"))?;
        Ok(Self { env })
    }

    pub fn render(
        &self,
        config: &AppConfig,
        banner: Option<&Banner>,
    ) -> Result<Html<String>, AppError> {
        let template = self.env.get_template(INDEX_TEMPLATE)?;
        let html = template.render(context! {
            region => &config.region,
            bucket => config.bucket.as_deref().unwrap_or("Not configured"),
            auth_method => config.auth_method().label(),
            banner => banner,
        })?;
        Ok(Html(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            bucket: Some("my-bucket".to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_banner_kind_parse() {
        assert_eq!(BannerKind::parse(None), BannerKind::Success);
        assert_eq!(BannerKind::parse(Some("error")), BannerKind::Error);
        assert_eq!(BannerKind::parse(Some("ERROR")), BannerKind::Error);
        assert_eq!(BannerKind::parse(Some("warning")), BannerKind::Success);
    }

    #[test]
    fn test_render_without_banner() {
        let pages = PageRenderer::new().unwrap();
        let Html(html) = pages.render(&config(), None).unwrap();
        assert!(html.contains("eu-west-1"));
        assert!(html.contains("my-bucket"));
        assert!(html.contains("AWS Default Credential Chain"));
        assert!(!html.contains("class=\"alert "));
    }

    #[test]
    fn test_render_unconfigured_bucket() {
        let pages = PageRenderer::new().unwrap();
        let Html(html) = pages.render(&AppConfig::default(), None).unwrap();
        assert!(html.contains("Not configured"));
    }

    #[test]
    fn test_render_escapes_message() {
        let pages = PageRenderer::new().unwrap();
        let banner = Banner::notice(BannerKind::Error, "<script>alert(1)</script>");
        let Html(html) = pages.render(&config(), Some(&banner)).unwrap();
        assert!(html.contains("class=\"alert alert-error\""));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_upload_banner() {
        let pages = PageRenderer::new().unwrap();
        let banner = Banner::uploaded(UploadResult {
            filename: "a.txt".to_string(),
            key: "uploads/20240101000000-a.txt".to_string(),
            url: "https://my-bucket.s3.eu-west-1.amazonaws.com/uploads/20240101000000-a.txt"
                .to_string(),
            bucket: "my-bucket".to_string(),
            region: "eu-west-1".to_string(),
        });
        let Html(html) = pages.render(&config(), Some(&banner)).unwrap();
        assert!(html.contains("class=\"alert alert-success\""));
        assert!(html.contains("File uploaded successfully!"));
        // minijinja escapes `/` as `&#x2f;` in HTML output
        assert!(html.contains("uploads&#x2f;20240101000000-a.txt"));
        assert!(html.contains("class=\"s3-link\""));
    }

    #[test]
    fn test_failed_banner_uses_error_message() {
        let banner = Banner::from(Err(UploadError::no_file()));
        assert_eq!(banner.kind, BannerKind::Error);
        assert_eq!(banner.message, "No file selected");
        assert!(banner.upload.is_none());
    }
}
