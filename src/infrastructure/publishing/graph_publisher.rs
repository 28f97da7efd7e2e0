//! Graph-API publisher.
//!
//! Flow mirrors the platform's container model:
//! 1. stage media on a public image host (the API only accepts URLs)
//! 2. create a media container (image, carousel or video)
//! 3. poll the container until processing finishes
//! 4. publish the container
//!
//! Aspect ratios outside the supported 4:5 .. 1.91:1 window are fixed by
//! compositing the image onto a blurred, darkened background canvas.

use std::io::Cursor;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat, imageops};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{PublishError, PublishRequest, PublishedPost, Publisher};
use async_trait::async_trait;

const IMAGE_HOST_URL: &str = "https://api.imgbb.com/1/upload";
const HOSTED_MEDIA_TTL_SECS: u32 = 86_400;

const MIN_RATIO: f32 = 4.0 / 5.0;
const MAX_RATIO: f32 = 1.91;

const CAROUSEL_MAX_ITEMS: usize = 10;

pub struct GraphApiPublisher {
    http: reqwest::Client,
    api_base: String,
    access_token: Option<String>,
    account_id: Option<String>,
    image_host_key: Option<String>,
}

impl GraphApiPublisher {
    pub fn new(
        api_base: String,
        access_token: Option<String>,
        account_id: Option<String>,
        image_host_key: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            access_token,
            account_id,
            image_host_key,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), PublishError> {
        match (self.access_token.as_deref(), self.account_id.as_deref()) {
            (Some(token), Some(account)) if !token.is_empty() && !account.is_empty() => {
                Ok((token, account))
            }
            _ => Err(PublishError::NotConfigured),
        }
    }

    /// Stages media bytes on the public image host and returns a direct URL.
    async fn host_media(&self, data: &[u8]) -> Result<String, PublishError> {
        let key = self
            .image_host_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(PublishError::NotConfigured)?;

        let form = [
            ("key", key.to_string()),
            ("image", BASE64.encode(data)),
            ("expiration", HOSTED_MEDIA_TTL_SECS.to_string()),
        ];
        let body: Value = self
            .http
            .post(IMAGE_HOST_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        if body["success"].as_bool() != Some(true) {
            let msg = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown image host error")
                .to_string();
            error!("image host upload failed: {msg}");
            return Err(PublishError::Api(msg));
        }
        // Direct image URL, not the page URL: the Graph API fetches the file.
        let url = body["data"]["display_url"]
            .as_str()
            .or_else(|| body["data"]["image"]["url"].as_str())
            .or_else(|| body["data"]["url"].as_str())
            .ok_or_else(|| PublishError::Api("image host returned no URL".into()))?;
        debug!("media staged at {url}");
        Ok(url.to_string())
    }

    async fn create_container(
        &self,
        params: Vec<(&'static str, String)>,
    ) -> Result<String, PublishError> {
        let (token, account) = self.credentials()?;
        let mut form = params;
        form.push(("access_token", token.to_string()));

        let body: Value = self
            .http
            .post(format!("{}/{}/media", self.api_base, account))
            .form(&form)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        match body["id"].as_str() {
            Some(id) => {
                debug!("media container created: {id}");
                Ok(id.to_string())
            }
            None => Err(api_error(&body, "container creation failed")),
        }
    }

    async fn container_status(&self, container_id: &str) -> Result<String, PublishError> {
        let (token, _) = self.credentials()?;
        let body: Value = self
            .http
            .get(format!("{}/{}", self.api_base, container_id))
            .query(&[("fields", "status_code,status"), ("access_token", token)])
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        Ok(body["status_code"].as_str().unwrap_or("UNKNOWN").to_string())
    }

    async fn wait_for_container(
        &self,
        container_id: &str,
        max_attempts: u32,
        delay: Duration,
    ) -> Result<(), PublishError> {
        for attempt in 1..=max_attempts {
            let status = self.container_status(container_id).await?;
            debug!("container {container_id} status {status} (attempt {attempt}/{max_attempts})");
            match status.as_str() {
                "FINISHED" => return Ok(()),
                "ERROR" | "EXPIRED" => {
                    return Err(PublishError::Api(format!(
                        "container {container_id} reached {status}"
                    )));
                }
                _ => tokio::time::sleep(delay).await,
            }
        }
        Err(PublishError::Timeout(format!(
            "container {container_id} not ready after {max_attempts} attempts"
        )))
    }

    async fn publish_container(&self, container_id: &str) -> Result<String, PublishError> {
        let (token, account) = self.credentials()?;
        let body: Value = self
            .http
            .post(format!("{}/{}/media_publish", self.api_base, account))
            .form(&[
                ("creation_id", container_id),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        match body["id"].as_str() {
            Some(id) => {
                info!("published post {id}");
                Ok(id.to_string())
            }
            None => Err(api_error(&body, "publish failed")),
        }
    }

    async fn publish_single_image(
        &self,
        image: &[u8],
        caption: &str,
    ) -> Result<PublishedPost, PublishError> {
        let fixed = fix_aspect_ratio(image);
        let url = self.host_media(&fixed).await?;
        let container = self
            .create_container(vec![
                ("image_url", url.clone()),
                ("caption", caption.to_string()),
            ])
            .await?;
        self.wait_for_container(&container, 30, Duration::from_secs(5))
            .await?;
        let post_id = self.publish_container(&container).await?;
        Ok(PublishedPost {
            post_id,
            media_url: Some(url),
        })
    }

    async fn publish_carousel(
        &self,
        images: Vec<&[u8]>,
        caption: &str,
    ) -> Result<PublishedPost, PublishError> {
        let images = &images[..images.len().min(CAROUSEL_MAX_ITEMS)];
        let mut children = Vec::with_capacity(images.len());
        let mut cover_url = None;

        for (i, image) in images.iter().enumerate() {
            let fixed = fix_aspect_ratio(image);
            let url = self.host_media(&fixed).await?;
            // Child containers carry no caption of their own
            let child = self
                .create_container(vec![
                    ("image_url", url.clone()),
                    ("is_carousel_item", "true".to_string()),
                ])
                .await?;
            debug!("carousel item {}/{} created: {child}", i + 1, images.len());
            cover_url.get_or_insert(url);
            children.push(child);
        }

        let parent = self
            .create_container(vec![
                ("media_type", "CAROUSEL".to_string()),
                ("caption", caption.to_string()),
                ("children", children.join(",")),
            ])
            .await?;
        self.wait_for_container(&parent, 30, Duration::from_secs(5))
            .await?;
        let post_id = self.publish_container(&parent).await?;
        Ok(PublishedPost {
            post_id,
            media_url: cover_url,
        })
    }

    async fn publish_video(
        &self,
        video: &[u8],
        caption: &str,
    ) -> Result<PublishedPost, PublishError> {
        let url = self.host_media(video).await?;
        let container = self
            .create_container(vec![
                ("video_url", url.clone()),
                ("caption", caption.to_string()),
                ("media_type", "REELS".to_string()),
            ])
            .await?;
        // Videos take longer to process
        self.wait_for_container(&container, 60, Duration::from_secs(10))
            .await?;
        let post_id = self.publish_container(&container).await?;
        Ok(PublishedPost {
            post_id,
            media_url: Some(url),
        })
    }
}

#[async_trait]
impl Publisher for GraphApiPublisher {
    fn is_configured(&self) -> bool {
        self.credentials().is_ok() && self.image_host_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn publish(&self, request: PublishRequest) -> Result<PublishedPost, PublishError> {
        self.credentials()?;
        if request.image.is_empty() {
            return Err(PublishError::InvalidRequest("missing cover image".into()));
        }

        if let Some(video) = &request.video {
            return self.publish_video(video, &request.caption).await;
        }
        if request.extra_images.is_empty() {
            return self.publish_single_image(&request.image, &request.caption).await;
        }
        let mut images: Vec<&[u8]> = vec![request.image.as_slice()];
        images.extend(request.extra_images.iter().map(|v| v.as_slice()));
        self.publish_carousel(images, &request.caption).await
    }
}

fn api_error(body: &Value, context: &str) -> PublishError {
    let msg = body["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());
    error!("{context}: {msg}");
    PublishError::Api(msg)
}

/// Fits an image into the supported aspect-ratio window.
///
/// Images already inside 4:5 .. 1.91:1 pass through untouched. Anything else
/// is centered at 90% size on a blurred, darkened copy of itself stretched to
/// the nearest legal ratio, then re-encoded as JPEG. On any processing
/// failure the original bytes are returned so publication can still proceed.
pub fn fix_aspect_ratio(data: &[u8]) -> Vec<u8> {
    let Ok(img) = image::load_from_memory(data) else {
        warn!("aspect fix skipped: image did not decode");
        return data.to_vec();
    };
    let (width, height) = (img.width(), img.height());
    let ratio = width as f32 / height as f32;
    if (MIN_RATIO..=MAX_RATIO).contains(&ratio) {
        return data.to_vec();
    }
    debug!("fixing aspect ratio {ratio:.2} ({width}x{height})");

    let (new_width, new_height) = if ratio < MIN_RATIO {
        // Too tall: widen the canvas to 4:5
        ((height as f32 * MIN_RATIO) as u32, height)
    } else {
        // Too wide: heighten the canvas to 1.91:1
        (width, (width as f32 / MAX_RATIO) as u32)
    };

    let mut background = img
        .resize_exact(new_width, new_height, imageops::FilterType::Lanczos3)
        .blur(30.0);
    background = background.brighten(-90);

    let (fit_width, fit_height) = if ratio < MIN_RATIO {
        let h = (new_height as f32 * 0.9) as u32;
        ((h as f32 * ratio) as u32, h)
    } else {
        let w = (new_width as f32 * 0.9) as u32;
        (w, (w as f32 / ratio) as u32)
    };
    let foreground = img.resize_exact(fit_width, fit_height, imageops::FilterType::Lanczos3);

    let x = (new_width.saturating_sub(fit_width)) / 2;
    let y = (new_height.saturating_sub(fit_height)) / 2;
    let mut canvas = background.to_rgb8();
    imageops::overlay(&mut canvas, &foreground.to_rgb8(), x as i64, y as i64);

    let mut buf = Cursor::new(Vec::new());
    match DynamicImage::ImageRgb8(canvas).write_to(&mut buf, ImageFormat::Jpeg) {
        Ok(()) => buf.into_inner(),
        Err(e) => {
            warn!("aspect fix re-encode failed, using original: {e}");
            data.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn encoded(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 40, 200]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn legal_ratio_passes_through_untouched() {
        let data = encoded(1000, 1000);
        assert_eq!(fix_aspect_ratio(&data), data);
    }

    #[test]
    fn tall_image_is_fit_into_window() {
        let data = encoded(200, 800);
        let fixed = fix_aspect_ratio(&data);
        assert_ne!(fixed, data);
        let img = image::load_from_memory(&fixed).unwrap();
        let ratio = img.width() as f32 / img.height() as f32;
        assert!(ratio >= MIN_RATIO - 0.02 && ratio <= MAX_RATIO + 0.02);
    }

    #[test]
    fn wide_image_is_fit_into_window() {
        let data = encoded(1200, 300);
        let fixed = fix_aspect_ratio(&data);
        let img = image::load_from_memory(&fixed).unwrap();
        let ratio = img.width() as f32 / img.height() as f32;
        assert!(ratio >= MIN_RATIO - 0.02 && ratio <= MAX_RATIO + 0.02);
    }

    #[test]
    fn unconfigured_publisher_reports_itself() {
        let publisher = GraphApiPublisher::new(
            "https://graph.example.com/v18.0".into(),
            None,
            None,
            None,
        );
        assert!(!publisher.is_configured());
    }
}
