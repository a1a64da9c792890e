//! Attachment-type routing
//!
//! Decides which conditional branches the graph schedules. The two text
//! branches are not routed; they always run.

use mailvoice_domain::ClassifiedMail;

/// A conditionally-scheduled extraction branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Vision extraction over the image attachments
    VisionFromImages,
    /// Prebuilt invoice-model extraction over the PDF attachments
    PrebuiltFromPdf,
}

impl Branch {
    /// Branch name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Branch::VisionFromImages => "vision-from-images",
            Branch::PrebuiltFromPdf => "prebuilt-from-pdf",
        }
    }
}

/// The router's decision for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePlan {
    branches: Vec<Branch>,
}

impl RoutePlan {
    /// Whether the router scheduled this branch.
    pub fn is_scheduled(&self, branch: Branch) -> bool {
        self.branches.contains(&branch)
    }

    /// The scheduled conditional branches.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// True when no conditional branch runs and the graph goes straight
    /// from the text branches to the aggregator.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// Pure routing decision over the classified buckets.
pub fn route(mail: &ClassifiedMail) -> RoutePlan {
    let mut branches = Vec::new();
    if !mail.images.is_empty() {
        branches.push(Branch::VisionFromImages);
    }
    if !mail.pdfs.is_empty() {
        branches.push(Branch::PrebuiltFromPdf);
    }
    RoutePlan { branches }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailvoice_domain::Attachment;

    fn mail(images: usize, pdfs: usize) -> ClassifiedMail {
        ClassifiedMail {
            text: String::new(),
            images: (0..images)
                .map(|i| Attachment::new(format!("img{}.png", i), vec![0]))
                .collect(),
            pdfs: (0..pdfs)
                .map(|i| Attachment::new(format!("doc{}.pdf", i), vec![0]))
                .collect(),
            tokens: 0,
        }
    }

    #[test]
    fn test_no_attachments_schedules_nothing() {
        let plan = route(&mail(0, 0));
        assert!(plan.is_empty());
        assert!(!plan.is_scheduled(Branch::VisionFromImages));
        assert!(!plan.is_scheduled(Branch::PrebuiltFromPdf));
    }

    #[test]
    fn test_images_schedule_vision_only() {
        let plan = route(&mail(2, 0));
        assert!(plan.is_scheduled(Branch::VisionFromImages));
        assert!(!plan.is_scheduled(Branch::PrebuiltFromPdf));
    }

    #[test]
    fn test_pdfs_schedule_prebuilt_only() {
        let plan = route(&mail(0, 1));
        assert!(!plan.is_scheduled(Branch::VisionFromImages));
        assert!(plan.is_scheduled(Branch::PrebuiltFromPdf));
    }

    #[test]
    fn test_both_buckets_schedule_both() {
        let plan = route(&mail(1, 1));
        assert_eq!(
            plan.branches(),
            &[Branch::VisionFromImages, Branch::PrebuiltFromPdf]
        );
    }

    #[test]
    fn test_routing_is_deterministic() {
        assert_eq!(route(&mail(1, 1)), route(&mail(1, 1)));
    }
}
