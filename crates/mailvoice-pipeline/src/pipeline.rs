//! The extraction graph runner

use crate::classify::classify;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::merge::{aggregate, merge_fields, Contribution};
use crate::prompt;
use crate::reply::parse_reply_fields;
use crate::route::{route, Branch, RoutePlan};
use mailvoice_domain::traits::{PdfRasterizer, PrebuiltExtractor, TextModel, VisionExtractor};
use mailvoice_domain::{
    Attachment, ClassifiedMail, ExtractionReport, Field, FieldSet, MailRequest, PartialResult,
};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info};

const NAMES_BRANCH: &str = "names-and-tax-ids";
const INVOICE_BRANCH: &str = "invoice-fields";

/// The extraction graph, generic over its four external services
///
/// One `run` call executes the whole graph for one request: the two text
/// branches always, the image and PDF branches as routed, then the join and
/// the aggregation. Branches run concurrently and suspend only at their
/// adapter calls; a failure in any branch aborts the run. Call deadlines are
/// the adapters' concern, not the graph's.
pub struct Pipeline<T, V, P, R> {
    text_model: Arc<T>,
    vision: Arc<V>,
    prebuilt: Arc<P>,
    rasterizer: Arc<R>,
    config: PipelineConfig,
}

impl<T, V, P, R> Pipeline<T, V, P, R>
where
    T: TextModel + Send + Sync,
    V: VisionExtractor + Send + Sync,
    P: PrebuiltExtractor + Send + Sync,
    R: PdfRasterizer + Send + Sync,
    T::Error: Display,
    V::Error: Display,
    P::Error: Display,
    R::Error: Display,
{
    /// Create a pipeline over the given adapters.
    pub fn new(text_model: T, vision: V, prebuilt: P, rasterizer: R, config: PipelineConfig) -> Self {
        Self {
            text_model: Arc::new(text_model),
            vision: Arc::new(vision),
            prebuilt: Arc::new(prebuilt),
            rasterizer: Arc::new(rasterizer),
            config,
        }
    }

    /// Run the graph for one request.
    pub async fn run(&self, request: &MailRequest) -> Result<ExtractionReport, PipelineError> {
        let mail = classify(request);
        if mail.text.len() > self.config.max_text_length {
            return Err(PipelineError::TextTooLong(
                mail.text.len(),
                self.config.max_text_length,
            ));
        }

        let plan = route(&mail);
        info!(
            images = mail.images.len(),
            pdfs = mail.pdfs.len(),
            scheduled = ?plan.branches().iter().map(Branch::name).collect::<Vec<_>>(),
            "request classified"
        );

        // Fan-out. The text branches are unconditional; the routed branches
        // resolve to an empty contribution when not scheduled.
        let (names, invoice, from_images, from_pdfs) = tokio::join!(
            self.names_and_tax_ids(&mail),
            self.invoice_fields(&mail),
            self.vision_from_images(&mail, &plan),
            self.prebuilt_then_vision(&mail, &plan),
        );

        // The join: contributions are folded in declaration order, never in
        // completion order, so conflicting field values resolve the same way
        // on every run (later contribution wins).
        let mail_contribution =
            Contribution::from_partials(vec![merge_fields(names?, invoice?)]);
        let contributions = [mail_contribution, from_images?, from_pdfs?];
        let report = aggregate(&contributions);

        info!(
            sources = report.extractions.len(),
            tokens = report.tokens,
            "aggregation complete"
        );
        Ok(report)
    }

    async fn names_and_tax_ids(&self, mail: &ClassifiedMail) -> Result<FieldSet, PipelineError> {
        let prompt = prompt::names_and_tax_ids_prompt(&mail.text);
        let reply = self.generate(NAMES_BRANCH, &prompt).await?;
        parse_reply_fields(
            &reply,
            NAMES_BRANCH,
            &[Field::CustomerName, Field::CustomerTaxId, Field::VendorTaxId],
        )
    }

    async fn invoice_fields(&self, mail: &ClassifiedMail) -> Result<FieldSet, PipelineError> {
        let prompt = prompt::invoice_fields_prompt(&mail.text);
        let reply = self.generate(INVOICE_BRANCH, &prompt).await?;
        parse_reply_fields(
            &reply,
            INVOICE_BRANCH,
            &[Field::InvoiceId, Field::InvoiceDate, Field::InvoiceTotal],
        )
    }

    async fn generate(
        &self,
        branch: &'static str,
        prompt: &str,
    ) -> Result<String, PipelineError> {
        debug!(branch, prompt_len = prompt.len(), "calling text model");
        self.text_model.generate(prompt).await.map_err(|e| {
            error!(branch, error = %e, "text model call failed");
            PipelineError::Text {
                branch,
                message: e.to_string(),
            }
        })
    }

    /// The routed image branch: vision over the direct image attachments.
    async fn vision_from_images(
        &self,
        mail: &ClassifiedMail,
        plan: &RoutePlan,
    ) -> Result<Contribution, PipelineError> {
        if !plan.is_scheduled(Branch::VisionFromImages) {
            return Ok(Contribution::empty());
        }
        let partials = self
            .vision_pass(Branch::VisionFromImages.name(), &mail.images)
            .await?;
        Ok(Contribution::from_partials(partials))
    }

    /// The routed PDF branch: prebuilt analysis, then unconditionally a vision
    /// pass over the direct images plus the rasterized PDF pages. The
    /// unconditional continuation doubles cost when the prebuilt model
    /// already succeeded; kept as the system behaves today and pinned by a
    /// test.
    async fn prebuilt_then_vision(
        &self,
        mail: &ClassifiedMail,
        plan: &RoutePlan,
    ) -> Result<Contribution, PipelineError> {
        if !plan.is_scheduled(Branch::PrebuiltFromPdf) {
            return Ok(Contribution::empty());
        }
        let branch = Branch::PrebuiltFromPdf.name();

        debug!(branch, pdfs = mail.pdfs.len(), "calling prebuilt extractor");
        let mut partials = self
            .prebuilt
            .extract_fields(&mail.pdfs, &Field::ALL)
            .await
            .map_err(|e| {
                error!(branch, error = %e, "prebuilt extraction failed");
                PipelineError::Prebuilt(e.to_string())
            })?;

        let mut pages = mail.images.clone();
        for pdf in &mail.pdfs {
            let rendered = self
                .rasterizer
                .rasterize(pdf, self.config.raster_dpi)
                .await
                .map_err(|e| {
                    error!(branch, source = %pdf.file_name, error = %e, "rasterization failed");
                    PipelineError::Raster(e.to_string())
                })?;
            pages.extend(rendered);
        }

        partials.extend(self.vision_pass(branch, &pages).await?);
        Ok(Contribution::from_partials(partials))
    }

    async fn vision_pass(
        &self,
        branch: &'static str,
        images: &[Attachment],
    ) -> Result<Vec<PartialResult>, PipelineError> {
        debug!(branch, images = images.len(), "calling vision extractor");
        self.vision
            .extract_fields(images, &Field::ALL)
            .await
            .map_err(|e| {
                error!(branch, error = %e, "vision extraction failed");
                PipelineError::Vision {
                    branch,
                    message: e.to_string(),
                }
            })
    }

    /// The pipeline's configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
