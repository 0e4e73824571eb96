use std::sync::Arc;

use sqlx::PgPool;
use url::Url;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    generation::{
        prompt, qr::format_url, styles, ImageSynthesizer, PngQrEncoder, QrEncoder, QrOptions,
        StickerStyle,
    },
    models::{ScanEvent, Sticker},
};

/// Input to the generation pipeline, as received from the client.
#[derive(Debug, Clone, Default)]
pub struct GenerateStickerInput {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub style_key: Option<String>,
    pub qr_code_data_url: Option<String>,
}

/// Everything the pipeline produced for one sticker, ready to persist.
pub struct StickerDraft {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub qr_code_data: String,
    pub sticker_image: String,
    pub style: &'static StickerStyle,
}

/// Runs the generation pipeline up to (but not including) persistence. Each
/// step gates the next; the first failure aborts the request with that
/// step's error. Steps: validate, normalize URL, resolve style, QR raster,
/// prompt, remote synthesis.
pub async fn build_sticker(
    input: &GenerateStickerInput,
    encoder: &dyn QrEncoder,
    synthesizer: &dyn ImageSynthesizer,
) -> AppResult<StickerDraft> {
    if input.title.trim().is_empty() || input.url.trim().is_empty() {
        return Err(AppError::Validation(
            "Title and URL are required".to_string(),
        ));
    }

    let formatted_url = format_url(input.url.trim());
    Url::parse(&formatted_url).map_err(|_| AppError::Validation("Invalid URL".to_string()))?;

    let style = styles::resolve(input.style_key.as_deref());

    let qr_code_data = match &input.qr_code_data_url {
        Some(data_url) => data_url.clone(),
        None => encoder.encode(&formatted_url, &QrOptions::default())?,
    };

    let prompt_text = prompt::compose(
        &input.title,
        input.description.as_deref(),
        style,
        &formatted_url,
    );

    let sticker_image = synthesizer.synthesize(&prompt_text, &qr_code_data).await?;

    Ok(StickerDraft {
        title: input.title.clone(),
        description: input.description.clone(),
        url: formatted_url,
        qr_code_data,
        sticker_image,
        style,
    })
}

pub struct StickerService {
    db: PgPool,
    encoder: Arc<dyn QrEncoder>,
    synthesizer: Arc<dyn ImageSynthesizer>,
}

impl StickerService {
    pub fn new(db: PgPool, synthesizer: Arc<dyn ImageSynthesizer>) -> Self {
        Self {
            db,
            encoder: Arc::new(PngQrEncoder),
            synthesizer,
        }
    }

    /// Generates a sticker end to end and persists it. A record is only
    /// written once every pipeline step has succeeded; there is no
    /// partial-success state.
    pub async fn generate(
        &self,
        user_id: Uuid,
        input: GenerateStickerInput,
    ) -> AppResult<Sticker> {
        let draft =
            build_sticker(&input, self.encoder.as_ref(), self.synthesizer.as_ref()).await?;

        let style_snapshot = serde_json::to_value(draft.style)
            .map_err(|e| anyhow::anyhow!("style snapshot serialization: {}", e))?;

        let sticker: Sticker = sqlx::query_as(
            r#"
            INSERT INTO stickers
                (id, user_id, title, description, url, qr_code_data,
                 sticker_image_url, theme, style_preferences)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.url)
        .bind(&draft.qr_code_data)
        .bind(&draft.sticker_image)
        .bind(draft.style.theme)
        .bind(style_snapshot)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(sticker_id = %sticker.id, user_id = %user_id, "sticker generated");
        Ok(sticker)
    }

    /// Own stickers, newest first.
    pub async fn list_stickers(&self, user_id: Uuid) -> AppResult<Vec<Sticker>> {
        let stickers: Vec<Sticker> = sqlx::query_as(
            "SELECT * FROM stickers WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(stickers)
    }

    pub async fn get_sticker(&self, user_id: Uuid, sticker_id: Uuid) -> AppResult<Sticker> {
        let sticker: Option<Sticker> =
            sqlx::query_as("SELECT * FROM stickers WHERE id = $1 AND user_id = $2")
                .bind(sticker_id)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        sticker.ok_or(AppError::StickerNotFound)
    }

    /// Public sticker view; private stickers look like they don't exist.
    pub async fn get_public_sticker(&self, sticker_id: Uuid) -> AppResult<Sticker> {
        let sticker: Option<Sticker> =
            sqlx::query_as("SELECT * FROM stickers WHERE id = $1 AND is_public = TRUE")
                .bind(sticker_id)
                .fetch_optional(&self.db)
                .await?;

        sticker.ok_or(AppError::StickerNotFound)
    }

    pub async fn set_visibility(
        &self,
        user_id: Uuid,
        sticker_id: Uuid,
        is_public: bool,
    ) -> AppResult<Sticker> {
        let sticker: Option<Sticker> = sqlx::query_as(
            r#"
            UPDATE stickers SET is_public = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(is_public)
        .bind(sticker_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        sticker.ok_or(AppError::StickerNotFound)
    }

    pub async fn delete_sticker(&self, user_id: Uuid, sticker_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM stickers WHERE id = $1 AND user_id = $2")
            .bind(sticker_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::StickerNotFound);
        }

        Ok(())
    }

    /// Records one scan and returns the redirect target.
    pub async fn record_scan(
        &self,
        sticker_id: Uuid,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
        referrer: Option<&str>,
    ) -> AppResult<String> {
        record_scan(self, sticker_id, user_agent, ip_address, referrer).await
    }
}

/// Storage seam for the scan path, mirroring the encoder/synthesizer seams
/// of the generation pipeline.
#[async_trait::async_trait]
pub trait ScanStore: Send + Sync {
    /// Redirect target for a sticker, or `None` when the id is unknown.
    async fn target_url(&self, sticker_id: Uuid) -> AppResult<Option<String>>;
    async fn insert_scan_event(
        &self,
        sticker_id: Uuid,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
        referrer: Option<&str>,
    ) -> AppResult<()>;
    async fn increment_scan_count(&self, sticker_id: Uuid) -> AppResult<()>;
}

#[async_trait::async_trait]
impl ScanStore for StickerService {
    async fn target_url(&self, sticker_id: Uuid) -> AppResult<Option<String>> {
        let target: Option<(String,)> = sqlx::query_as("SELECT url FROM stickers WHERE id = $1")
            .bind(sticker_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(target.map(|(url,)| url))
    }

    async fn insert_scan_event(
        &self,
        sticker_id: Uuid,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
        referrer: Option<&str>,
    ) -> AppResult<()> {
        let event: ScanEvent = sqlx::query_as(
            r#"
            INSERT INTO sticker_analytics (id, sticker_id, user_agent, ip_address, referrer)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sticker_id)
        .bind(user_agent)
        .bind(ip_address)
        .bind(referrer)
        .fetch_one(&self.db)
        .await?;

        tracing::debug!(scan_id = %event.id, sticker_id = %sticker_id, "scan recorded");
        Ok(())
    }

    async fn increment_scan_count(&self, sticker_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE stickers SET scan_count = scan_count + 1 WHERE id = $1")
            .bind(sticker_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

/// Scan flow over the store seam. Unknown ids fail before any side effect.
/// The analytics insert is best-effort: a failure there is logged and never
/// blocks the redirect; a failed counter update does abort.
pub async fn record_scan(
    store: &dyn ScanStore,
    sticker_id: Uuid,
    user_agent: Option<&str>,
    ip_address: Option<&str>,
    referrer: Option<&str>,
) -> AppResult<String> {
    let url = store
        .target_url(sticker_id)
        .await?
        .ok_or(AppError::StickerNotFound)?;

    if let Err(e) = store
        .insert_scan_event(sticker_id, user_agent, ip_address, referrer)
        .await
    {
        tracing::warn!(sticker_id = %sticker_id, "failed to record scan event: {}", e);
    }

    store.increment_scan_count(sticker_id).await?;

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct CountingEncoder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl QrEncoder for CountingEncoder {
        fn encode(&self, _data: &str, _options: &QrOptions) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Encoding("boom".to_string()));
            }
            Ok("data:image/png;base64,cXI=".to_string())
        }
    }

    #[derive(Default)]
    struct CountingSynthesizer {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ImageSynthesizer for CountingSynthesizer {
        async fn synthesize(&self, _prompt: &str, _qr: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Generation("model unreachable".to_string()));
            }
            Ok("data:image/png;base64,aW1n".to_string())
        }
    }

    fn input(title: &str, url: &str) -> GenerateStickerInput {
        GenerateStickerInput {
            title: title.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_title_fails_before_any_adapter_call() {
        let encoder = CountingEncoder::default();
        let synth = CountingSynthesizer::default();

        let err = build_sticker(&input("", "example.com"), &encoder, &synth).await;

        assert!(matches!(err, Err(AppError::Validation(_))));
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scheme_is_added_and_encoder_invoked_once() {
        let encoder = CountingEncoder::default();
        let synth = CountingSynthesizer::default();

        let draft = build_sticker(&input("My Shop", "example.com"), &encoder, &synth)
            .await
            .unwrap();

        assert_eq!(draft.url, "https://example.com");
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn supplied_qr_raster_skips_the_encoder() {
        let encoder = CountingEncoder::default();
        let synth = CountingSynthesizer::default();

        let mut req = input("My Shop", "https://example.com");
        req.qr_code_data_url = Some("data:image/png;base64,cHJl".to_string());

        let draft = build_sticker(&req, &encoder, &synth).await.unwrap();

        assert_eq!(draft.qr_code_data, "data:image/png;base64,cHJl");
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_style_key_falls_back_to_modern() {
        let encoder = CountingEncoder::default();
        let synth = CountingSynthesizer::default();

        let mut req = input("My Shop", "example.com");
        req.style_key = Some("does-not-exist".to_string());

        let draft = build_sticker(&req, &encoder, &synth).await.unwrap();
        assert_eq!(draft.style.theme, "Modern Clean");
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let encoder = CountingEncoder::default();
        let synth = CountingSynthesizer::default();

        let err = build_sticker(&input("My Shop", "not a url"), &encoder, &synth).await;

        assert!(matches!(err, Err(AppError::Validation(_))));
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn synthesizer_failure_propagates_unchanged() {
        let encoder = CountingEncoder::default();
        let synth = CountingSynthesizer {
            fail: true,
            ..Default::default()
        };

        let err = build_sticker(&input("My Shop", "example.com"), &encoder, &synth).await;

        assert!(matches!(err, Err(AppError::Generation(_))));
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn encoder_failure_stops_before_synthesis() {
        let encoder = CountingEncoder {
            fail: true,
            ..Default::default()
        };
        let synth = CountingSynthesizer::default();

        let err = build_sticker(&input("My Shop", "example.com"), &encoder, &synth).await;

        assert!(matches!(err, Err(AppError::Encoding(_))));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[derive(Default)]
    struct CountingScanStore {
        known: bool,
        insert_fails: bool,
        inserts: AtomicUsize,
        increments: AtomicUsize,
    }

    #[async_trait]
    impl ScanStore for CountingScanStore {
        async fn target_url(&self, _sticker_id: Uuid) -> AppResult<Option<String>> {
            Ok(self.known.then(|| "https://example.com".to_string()))
        }

        async fn insert_scan_event(
            &self,
            _sticker_id: Uuid,
            _user_agent: Option<&str>,
            _ip_address: Option<&str>,
            _referrer: Option<&str>,
        ) -> AppResult<()> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.insert_fails {
                return Err(AppError::Database(sqlx::Error::PoolClosed));
            }
            Ok(())
        }

        async fn increment_scan_count(&self, _sticker_id: Uuid) -> AppResult<()> {
            self.increments.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn unknown_sticker_scan_has_no_side_effects() {
        let store = CountingScanStore::default();

        let err = record_scan(&store, Uuid::new_v4(), Some("agent"), None, None).await;

        assert!(matches!(err, Err(AppError::StickerNotFound)));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
        assert_eq!(store.increments.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scan_records_event_and_bumps_counter() {
        let store = CountingScanStore {
            known: true,
            ..Default::default()
        };

        let url = record_scan(&store, Uuid::new_v4(), Some("agent"), Some("1.2.3.4"), None)
            .await
            .unwrap();

        assert_eq!(url, "https://example.com");
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(store.increments.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_analytics_insert_does_not_block_redirect() {
        let store = CountingScanStore {
            known: true,
            insert_fails: true,
            ..Default::default()
        };

        let url = record_scan(&store, Uuid::new_v4(), None, None, None)
            .await
            .unwrap();

        assert_eq!(url, "https://example.com");
        assert_eq!(store.increments.load(Ordering::SeqCst), 1);
    }
}
