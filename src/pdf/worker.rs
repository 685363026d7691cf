//! PDF render worker - runs in a dedicated thread

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::cache::{CacheKey, PageCache};
use super::engine::{PdfDocument, PdfEngine, PdfError};
use super::renderer::PageRenderer;
use super::request::{DocumentInfo, RenderRequest, RenderResponse};

/// Main worker function.
///
/// Owns the parsed document; a failed `Load` keeps the previous one.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(
    engine: Box<dyn PdfEngine>,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
    cache_size: usize,
) {
    let mut doc: Option<Box<dyn PdfDocument>> = None;
    let mut cache = PageCache::new(cache_size);

    for request in requests {
        match request {
            RenderRequest::Load { generation, bytes } => match engine.open(&bytes) {
                Ok(parsed) => {
                    let info = DocumentInfo {
                        page_count: parsed.page_count(),
                        title: parsed.title(),
                    };
                    debug!("Parsed document: {} pages", info.page_count);
                    doc = Some(parsed);
                    cache.invalidate_all();
                    let _ = responses.send(RenderResponse::Loaded { generation, info });
                }
                Err(error) => {
                    warn!("Failed to parse document: {error}");
                    let _ = responses.send(RenderResponse::LoadFailed { generation, error });
                }
            },

            RenderRequest::Page {
                id,
                generation,
                target,
            } => {
                let Some(doc) = doc.as_deref() else {
                    let _ = responses.send(RenderResponse::Error {
                        id,
                        generation,
                        error: PdfError::generic("no document loaded"),
                    });
                    continue;
                };

                let key = CacheKey::from_target(&target);
                if let Some(cached) = cache.get(&key) {
                    let _ = responses.send(RenderResponse::Page {
                        id,
                        generation,
                        page: cached,
                    });
                    continue;
                }

                match PageRenderer::render(doc, target.page, target.scale) {
                    Ok(rendered) => {
                        let page = cache.insert(key, rendered);
                        let _ = responses.send(RenderResponse::Page {
                            id,
                            generation,
                            page,
                        });
                    }
                    Err(error) => {
                        let _ = responses.send(RenderResponse::Error {
                            id,
                            generation,
                            error,
                        });
                    }
                }
            }

            RenderRequest::Shutdown => break,
        }
    }
}
