//! Orchestration: outline → page images → print sheet.
//!
//! Every operation here is a short sequence of store reads, one collaborator
//! call, and store writes. The collaborators are traits so provider HTTP
//! clients live outside the crate:
//!
//! | Trait | Provides |
//! |---|---|
//! | [`OutlineGenerator`] | text completion (outline and page refinement) |
//! | [`ImageGenerator`] | render from prompt, transform an existing image |
//! | [`Inpainter`] | repaint a masked region |
//! | [`JobProvider`] | submit/poll primitives for queue-based providers |
//!
//! Providers that answer with a job id are adapted to [`ImageGenerator`] by
//! [`PolledImageGenerator`]; several generators are chained by
//! [`FallbackImageGenerator`].
//!
//! Errors surface as [`PipelineError`], which also defines the HTTP status
//! and JSON body a web front end returns for each failure.

use crate::config::GenerationConfig;
use crate::imaging::{
    BackendError, Compression, ImageBackend, ensure_png, get_dimensions, prepare_mask,
    render_placeholder,
};
use crate::jobs::{JobError, JobStatus, PollPolicy, RegenerationMode, poll_until_complete};
use crate::layout::{
    CoverFit, LayoutError, LayoutOptions, PrintLayout, create_print_layout, plan_cover_fit,
};
use crate::outline::{ParseError, parse_outline, parse_page_refinement};
use crate::prompts::{outline_prompt, page_image_prompt, refine_prompt, text_inpaint_prompt};
use crate::store::{StoreError, ZineStore};
use crate::types::{PageNumber, PageOutline, Style, Tone, Zine};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Collaborators
// ============================================================================

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("{provider}: {message}")]
    Request { provider: String, message: String },
    #[error("{provider}: response contained no image")]
    EmptyResponse { provider: String },
    #[error(transparent)]
    Job(#[from] JobError),
    #[error("No image providers configured")]
    NoProviders,
}

impl CollaboratorError {
    pub fn request(provider: &str, message: impl Into<String>) -> Self {
        CollaboratorError::Request {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

/// LLM text completion.
pub trait OutlineGenerator {
    fn complete(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// Image generation. Returned bytes may be any decodable format.
pub trait ImageGenerator {
    /// Provider name for logs.
    fn name(&self) -> &str;

    fn render(&self, prompt: &str) -> Result<Vec<u8>, CollaboratorError>;

    /// Image-to-image with the given denoising strength (0.0–1.0).
    fn transform(
        &self,
        image: &[u8],
        prompt: &str,
        strength: f32,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

/// Masked-region editing. The mask always matches the image's size.
pub trait Inpainter {
    fn inpaint(&self, image: &[u8], mask: &[u8], prompt: &str)
    -> Result<Vec<u8>, CollaboratorError>;
}

/// Tries each generator in order and returns the first image produced.
pub struct FallbackImageGenerator {
    providers: Vec<Box<dyn ImageGenerator>>,
}

impl FallbackImageGenerator {
    pub fn new(providers: Vec<Box<dyn ImageGenerator>>) -> Self {
        Self { providers }
    }

    fn first_success(
        &self,
        mut call: impl FnMut(&dyn ImageGenerator) -> Result<Vec<u8>, CollaboratorError>,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let mut last_error = CollaboratorError::NoProviders;
        for provider in &self.providers {
            match call(provider.as_ref()) {
                Ok(image) => return Ok(image),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "image provider failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

impl ImageGenerator for FallbackImageGenerator {
    fn name(&self) -> &str {
        "fallback"
    }

    fn render(&self, prompt: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.first_success(|p| p.render(prompt))
    }

    fn transform(
        &self,
        image: &[u8],
        prompt: &str,
        strength: f32,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.first_success(|p| p.transform(image, prompt, strength))
    }
}

/// What a queue-based provider is asked to do.
#[derive(Debug, Clone, Copy)]
pub struct JobRequest<'a> {
    pub prompt: &'a str,
    /// Starting image for image-to-image jobs.
    pub init_image: Option<&'a [u8]>,
    pub strength: f32,
}

/// Answer to a submission: some providers finish inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Ready(Vec<u8>),
    Queued(String),
}

/// Submit/poll primitives of a queue-based image provider.
pub trait JobProvider {
    fn name(&self) -> &str;
    fn submit(&self, request: &JobRequest) -> Result<Submission, CollaboratorError>;
    fn status(&self, job: &str) -> Result<JobStatus<Vec<u8>>, CollaboratorError>;
}

/// Adapts a [`JobProvider`] to [`ImageGenerator`] with bounded polling.
pub struct PolledImageGenerator<P> {
    provider: P,
    policy: PollPolicy,
    sleep: fn(Duration),
}

impl<P: JobProvider> PolledImageGenerator<P> {
    pub fn new(provider: P, policy: PollPolicy) -> Self {
        Self {
            provider,
            policy,
            sleep: std::thread::sleep,
        }
    }

    /// Replace the sleep between polls.
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    fn run(&self, request: &JobRequest) -> Result<Vec<u8>, CollaboratorError> {
        match self.provider.submit(request)? {
            Submission::Ready(image) => Ok(image),
            Submission::Queued(job) => {
                info!(provider = self.provider.name(), job = %job, "job queued");
                let image = poll_until_complete(
                    &job,
                    self.policy,
                    |_| self.provider.status(&job),
                    self.sleep,
                )?;
                Ok(image)
            }
        }
    }
}

impl<P: JobProvider> ImageGenerator for PolledImageGenerator<P> {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn render(&self, prompt: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.run(&JobRequest {
            prompt,
            init_image: None,
            strength: RegenerationMode::Regenerate.strength(),
        })
    }

    fn transform(
        &self,
        image: &[u8],
        prompt: &str,
        strength: f32,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.run(&JobRequest {
            prompt,
            init_image: Some(image),
            strength,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Page {page} of zine {zine} has no image")]
    PageNotRendered { zine: String, page: PageNumber },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Image(#[from] BackendError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl PipelineError {
    /// HTTP status for this failure: 400 bad input, 404 unknown zine or
    /// page, 500 everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidRequest(_) => 400,
            PipelineError::Store(StoreError::InvalidId(_) | StoreError::InvalidReference(_)) => {
                400
            }
            PipelineError::Store(StoreError::IncompletePages { .. })
            | PipelineError::Layout(
                LayoutError::MissingPages { .. } | LayoutError::ExtraPages { .. },
            ) => 400,
            PipelineError::Store(StoreError::ZineNotFound(_))
            | PipelineError::PageNotRendered { .. } => 404,
            _ => 500,
        }
    }

    /// JSON error body: `{"error": "<message>"}`.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Brief for a new zine.
#[derive(Debug, Clone, PartialEq)]
pub struct ZineRequest {
    pub topic: String,
    pub style: Style,
    pub tone: Tone,
}

/// Ask for an outline, validate it, and store the new zine.
pub fn create_zine(
    store: &impl ZineStore,
    outlines: &impl OutlineGenerator,
    request: &ZineRequest,
) -> Result<Zine, PipelineError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(PipelineError::InvalidRequest("topic is required".into()));
    }
    let response = outlines.complete(&outline_prompt(topic, request.style, request.tone))?;
    let pages = parse_outline(&response)?;
    zine_from_outline(store, topic, request.style, request.tone, pages)
}

/// Store a new zine from an already-parsed outline.
pub fn zine_from_outline(
    store: &impl ZineStore,
    topic: &str,
    style: Style,
    tone: Tone,
    pages: Vec<PageOutline>,
) -> Result<Zine, PipelineError> {
    let zine = Zine::new(topic, style, tone, pages)
        .ok_or_else(|| PipelineError::InvalidRequest("outline must cover pages 1-8".into()))?;
    store.save_zine(&zine)?;
    info!(zine = %zine.id, topic, "zine created");
    Ok(zine)
}

fn save_page(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    zine: &mut Zine,
    page: PageNumber,
    image: &[u8],
) -> Result<String, PipelineError> {
    let png = ensure_png(backend, image)?;
    let reference = store.save_page_image(&zine.id, page, &png)?;
    zine.set_page_ref(page, reference.clone());
    store.save_zine(zine)?;
    Ok(reference)
}

fn read_page(
    store: &impl ZineStore,
    zine: &Zine,
    page: PageNumber,
) -> Result<Vec<u8>, PipelineError> {
    let reference = store.page_image_path(&zine.id, page)?;
    store.read_file(&reference).map_err(|e| match e {
        StoreError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            PipelineError::PageNotRendered {
                zine: zine.id.clone(),
                page,
            }
        }
        other => other.into(),
    })
}

/// Encode a placeholder for `page` as PNG.
pub fn placeholder_png(
    backend: &impl ImageBackend,
    page: &PageOutline,
    style: Style,
) -> Result<Vec<u8>, PipelineError> {
    Ok(backend.encode_png(&render_placeholder(page, style), Compression::Default)?)
}

/// Render `prompt` for `outline`, or draw its placeholder when the provider
/// fails and `placeholder_fallback` is set.
fn render_or_placeholder(
    backend: &impl ImageBackend,
    images: &impl ImageGenerator,
    zine: &Zine,
    outline: &PageOutline,
    prompt: &str,
    settings: &GenerationConfig,
) -> Result<Vec<u8>, PipelineError> {
    match images.render(prompt) {
        Ok(image) => Ok(image),
        Err(e) if settings.placeholder_fallback => {
            warn!(
                zine = %zine.id,
                page = outline.page_number.get(),
                error = %e,
                "using placeholder page"
            );
            placeholder_png(backend, outline, zine.style)
        }
        Err(e) => Err(e.into()),
    }
}

/// Render a page from its outline and store it.
///
/// With `placeholder_fallback` set, a provider failure stores a styled
/// placeholder instead of failing.
pub fn generate_page(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    images: &impl ImageGenerator,
    zine_id: &str,
    page: PageNumber,
    settings: &GenerationConfig,
) -> Result<String, PipelineError> {
    let mut zine = store.load_zine(zine_id)?;
    let outline = zine.page(page).clone();
    let prompt = page_image_prompt(
        &outline,
        zine.style,
        zine.tone,
        None,
        settings.prompt_max_chars,
    );

    let image = render_or_placeholder(backend, images, &zine, &outline, &prompt, settings)?;
    let reference = save_page(store, backend, &mut zine, page, &image)?;
    info!(zine = zine_id, page = page.get(), "page generated");
    Ok(reference)
}

/// Feedback-driven page regeneration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerateRequest {
    pub zine_id: String,
    pub page: PageNumber,
    pub feedback: String,
    pub mode: RegenerationMode,
}

/// Result of a regeneration: the revised outline and the new image.
#[derive(Debug, Clone, PartialEq)]
pub struct RegeneratedPage {
    pub outline: PageOutline,
    pub reference: String,
    pub mode: RegenerationMode,
}

/// Revise a page's outline from feedback, then redraw it.
///
/// `Refine` and `Revise` transform the current image; `Regenerate` renders
/// from the revised outline alone, falling back to a placeholder like
/// [`generate_page`].
pub fn regenerate_page(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    outlines: &impl OutlineGenerator,
    images: &impl ImageGenerator,
    request: &RegenerateRequest,
    settings: &GenerationConfig,
) -> Result<RegeneratedPage, PipelineError> {
    let feedback = request.feedback.trim();
    if feedback.is_empty() {
        return Err(PipelineError::InvalidRequest("feedback is required".into()));
    }
    let mut zine = store.load_zine(&request.zine_id)?;
    let current = zine.page(request.page).clone();

    let response = outlines.complete(&refine_prompt(&current, feedback, zine.style, zine.tone))?;
    let revised = parse_page_refinement(&response, &current)?;

    let image = if request.mode.transforms_existing() {
        let existing = read_page(store, &zine, request.page)?;
        images.transform(&existing, &revised.image_prompt, request.mode.strength())?
    } else {
        let prompt = page_image_prompt(
            &revised,
            zine.style,
            zine.tone,
            Some(feedback),
            settings.prompt_max_chars,
        );
        render_or_placeholder(backend, images, &zine, &revised, &prompt, settings)?
    };

    zine.set_outline(revised.clone());
    let reference = save_page(store, backend, &mut zine, request.page, &image)?;
    info!(
        zine = %request.zine_id,
        page = request.page.get(),
        mode = %request.mode,
        "page regenerated"
    );
    Ok(RegeneratedPage {
        outline: revised,
        reference,
        mode: request.mode,
    })
}

/// Prepare a mask, reporting an undecodable one as a bad request.
fn fit_mask(
    backend: &impl ImageBackend,
    mask: &[u8],
    page_image: &[u8],
) -> Result<Vec<u8>, PipelineError> {
    prepare_mask(backend, mask, page_image).map_err(|e| match e {
        BackendError::Decode(reason) => {
            PipelineError::InvalidRequest(format!("mask is not a readable image: {reason}"))
        }
        other => other.into(),
    })
}

/// Replace the text inside a masked region of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct InpaintRequest {
    pub zine_id: String,
    pub page: PageNumber,
    /// Any decodable image; white marks the region to repaint.
    pub mask: Vec<u8>,
    pub text: String,
}

/// Repaint the masked region of a page with new text.
pub fn inpaint_page(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    inpainter: &impl Inpainter,
    request: &InpaintRequest,
) -> Result<String, PipelineError> {
    if request.text.trim().is_empty() || request.mask.is_empty() {
        return Err(PipelineError::InvalidRequest(
            "mask and text are required".into(),
        ));
    }
    let mut zine = store.load_zine(&request.zine_id)?;
    let page_image = read_page(store, &zine, request.page)?;
    let mask = fit_mask(backend, &request.mask, &page_image)?;

    let prompt = text_inpaint_prompt(&request.text, zine.style, zine.tone);
    let edited = inpainter.inpaint(&page_image, &mask, &prompt)?;
    let reference = save_page(store, backend, &mut zine, request.page, &edited)?;
    info!(zine = %request.zine_id, page = request.page.get(), "page inpainted");
    Ok(reference)
}

/// Store (or replace) a page image supplied by hand.
///
/// Any decodable format is accepted and stored as PNG.
pub fn add_page_image(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    zine_id: &str,
    page: PageNumber,
    image: &[u8],
) -> Result<String, PipelineError> {
    let mut zine = store.load_zine(zine_id)?;
    backend.identify(image).map_err(|e| {
        PipelineError::InvalidRequest(format!("page {page} is not a readable image: {e}"))
    })?;
    let reference = save_page(store, backend, &mut zine, page, image)?;
    info!(zine = zine_id, page = page.get(), "page image added");
    Ok(reference)
}

/// The image prompt a page would be rendered with.
pub fn page_prompt(
    store: &impl ZineStore,
    zine_id: &str,
    page: PageNumber,
    feedback: Option<&str>,
    settings: &GenerationConfig,
) -> Result<String, PipelineError> {
    let zine = store.load_zine(zine_id)?;
    Ok(page_image_prompt(
        zine.page(page),
        zine.style,
        zine.tone,
        feedback,
        settings.prompt_max_chars,
    ))
}

/// A mask sized and binarized for one stored page.
pub fn page_mask(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    zine_id: &str,
    page: PageNumber,
    mask: &[u8],
) -> Result<Vec<u8>, PipelineError> {
    let zine = store.load_zine(zine_id)?;
    let page_image = read_page(store, &zine, page)?;
    fit_mask(backend, mask, &page_image)
}

/// Store a placeholder for every page that has no image yet.
///
/// Returns the pages that were filled.
pub fn fill_placeholders(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    zine_id: &str,
) -> Result<Vec<PageNumber>, PipelineError> {
    let mut zine = store.load_zine(zine_id)?;
    let mut filled = Vec::new();
    for page in PageNumber::all() {
        let reference = store.page_image_path(zine_id, page)?;
        if store.file_exists(&reference)? {
            continue;
        }
        let png = placeholder_png(backend, zine.page(page), zine.style)?;
        save_page(store, backend, &mut zine, page, &png)?;
        filled.push(page);
    }
    info!(zine = zine_id, pages = filled.len(), "placeholders stored");
    Ok(filled)
}

/// Image state of one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageStatus {
    Missing,
    Unreadable(String),
    /// Decodable, with the cover-fit it will get on the sheet.
    Ready { width: u32, height: u32, fit: CoverFit },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageCheck {
    pub outline: PageOutline,
    pub status: PageStatus,
}

impl PageCheck {
    pub fn is_ready(&self) -> bool {
        matches!(self.status, PageStatus::Ready { .. })
    }
}

/// Inspect every page of a zine without composing anything.
pub fn check_zine(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    zine_id: &str,
) -> Result<(Zine, Vec<PageCheck>), PipelineError> {
    let zine = store.load_zine(zine_id)?;
    let mut checks = Vec::with_capacity(zine.outline.len());
    for page in PageNumber::all() {
        let status = match read_page(store, &zine, page) {
            Ok(bytes) => match get_dimensions(backend, &bytes) {
                Ok((width, height)) => PageStatus::Ready {
                    width,
                    height,
                    fit: plan_cover_fit((width, height)),
                },
                Err(e) => PageStatus::Unreadable(e.to_string()),
            },
            Err(PipelineError::PageNotRendered { .. }) => PageStatus::Missing,
            Err(e) => return Err(e),
        };
        checks.push(PageCheck {
            outline: zine.page(page).clone(),
            status,
        });
    }
    Ok((zine, checks))
}

/// Compose all 8 stored pages into the print sheet and store it.
pub fn assemble_print_layout(
    store: &impl ZineStore,
    backend: &impl ImageBackend,
    zine_id: &str,
    options: &LayoutOptions,
) -> Result<(String, PrintLayout), PipelineError> {
    store.load_zine(zine_id)?;
    let pages = store
        .all_page_paths(zine_id)?
        .iter()
        .map(|reference| store.read_file(reference))
        .collect::<Result<Vec<_>, _>>()?;

    let layout = create_print_layout(backend, &pages, options)?;
    let reference = store.save_print_layout(zine_id, &layout.png)?;
    info!(zine = zine_id, reference = %reference, "print layout saved");
    Ok((reference, layout))
}
