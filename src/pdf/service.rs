//! Render service - owns the worker thread and the in-flight guard

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::engine::PdfEngine;
use super::request::{RenderRequest, RenderResponse, RenderTarget, RequestId};
use super::worker::render_worker;
use super::DEFAULT_CACHE_SIZE;

/// A response the controller should act on, with stale results filtered out
#[derive(Debug)]
pub enum ServiceEvent {
    Loaded(super::request::DocumentInfo),
    LoadFailed(super::engine::PdfError),
    Rendered(std::sync::Arc<super::renderer::RenderedPage>),
    RenderFailed {
        target: RenderTarget,
        error: super::engine::PdfError,
    },
}

/// Runs rendering on a background thread.
///
/// At most one page render is in flight. Requests made while one is running
/// overwrite a single queued slot, so the most recent request wins and
/// intermediate ones are never rendered.
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
    next_generation: u64,
    /// Generation of the document currently accepted by the controller
    doc_generation: u64,
    pending_load: Option<u64>,
    in_flight: Option<(RequestId, RenderTarget)>,
    queued: Option<RenderTarget>,
}

impl RenderService {
    #[must_use]
    pub fn new(engine: Box<dyn PdfEngine>) -> Self {
        Self::with_cache_size(engine, DEFAULT_CACHE_SIZE)
    }

    #[must_use]
    pub fn with_cache_size(engine: Box<dyn PdfEngine>, cache_size: usize) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::Builder::new()
            .name("pdf-render".into())
            .spawn(move || render_worker(engine, request_rx, response_tx, cache_size))
            .map_err(|e| log::error!("Failed to spawn render worker: {e}"))
            .ok();

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            next_generation: 1,
            doc_generation: 0,
            pending_load: None,
            in_flight: None,
            queued: None,
        }
    }

    /// Hand raw bytes to the worker for parsing
    pub fn load(&mut self, bytes: Vec<u8>) {
        let generation = self.next_generation;
        self.next_generation += 1;
        match self
            .request_tx
            .send(RenderRequest::Load { generation, bytes })
        {
            Ok(()) => self.pending_load = Some(generation),
            Err(_) => warn!("Render worker is gone; document load dropped"),
        }
    }

    /// Request a render; coalesces with any render already running
    pub fn request(&mut self, target: RenderTarget) {
        if self.in_flight.is_some() {
            debug!("Render in flight, queueing page {}", target.page);
            self.queued = Some(target);
            return;
        }
        self.send_page(target);
    }

    fn send_page(&mut self, target: RenderTarget) {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        match self.request_tx.send(RenderRequest::Page {
            id,
            generation: self.doc_generation,
            target,
        }) {
            Ok(()) => self.in_flight = Some((id, target)),
            Err(_) => warn!("Render worker is gone; page {} not rendered", target.page),
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.queued.is_some() || self.pending_load.is_some()
    }

    /// Drain worker responses without blocking
    pub fn poll(&mut self) -> Vec<ServiceEvent> {
        let mut events = Vec::new();
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle(response, &mut events);
        }
        events
    }

    /// Block up to `timeout` for the next response, then drain the rest
    pub fn poll_timeout(&mut self, timeout: std::time::Duration) -> Vec<ServiceEvent> {
        let mut events = Vec::new();
        if let Ok(response) = self.response_rx.recv_timeout(timeout) {
            self.handle(response, &mut events);
        }
        events.extend(self.poll());
        events
    }

    fn handle(&mut self, response: RenderResponse, events: &mut Vec<ServiceEvent>) {
        match response {
            RenderResponse::Loaded { generation, info } => {
                if self.pending_load != Some(generation) {
                    debug!("Dropping superseded load {generation}");
                    return;
                }
                self.pending_load = None;
                self.doc_generation = generation;
                // Renders for the previous document are now meaningless
                self.queued = None;
                events.push(ServiceEvent::Loaded(info));
            }
            RenderResponse::LoadFailed { generation, error } => {
                if self.pending_load == Some(generation) {
                    self.pending_load = None;
                    events.push(ServiceEvent::LoadFailed(error));
                }
            }
            RenderResponse::Page {
                id,
                generation,
                page,
            } => {
                if !self.complete(id) {
                    return;
                }
                if generation != self.doc_generation {
                    debug!("Dropping render from document generation {generation}");
                    self.drain_queue();
                    return;
                }
                if self.drain_queue() {
                    debug!("Dropping page {} superseded by a newer request", page.page);
                    return;
                }
                events.push(ServiceEvent::Rendered(page));
            }
            RenderResponse::Error {
                id,
                generation,
                error,
            } => {
                let target = self.in_flight.filter(|(in_id, _)| *in_id == id).map(|(_, t)| t);
                if !self.complete(id) {
                    return;
                }
                let superseded = self.drain_queue();
                if generation != self.doc_generation || superseded {
                    return;
                }
                if let Some(target) = target {
                    events.push(ServiceEvent::RenderFailed { target, error });
                }
            }
        }
    }

    /// Clear the in-flight slot if `id` is the running request
    fn complete(&mut self, id: RequestId) -> bool {
        match self.in_flight {
            Some((in_id, _)) if in_id == id => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Send the queued request if any; returns whether one was sent
    fn drain_queue(&mut self) -> bool {
        match self.queued.take() {
            Some(target) => {
                self.send_page(target);
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
