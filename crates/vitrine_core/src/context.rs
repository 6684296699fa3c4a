//! Borrowed page context handed to every controller
//!
//! The page owns the document and the scheduler; controllers get both through
//! a short-lived [`PageContext`] instead of reaching for globals.

use crate::document::Document;
use crate::scheduler::Scheduler;
use crate::task::Task;

/// Shared collaborators for one dispatch
pub struct PageContext<'a, D: Document> {
    /// Host document
    pub document: &'a D,
    /// Page task queue
    pub scheduler: &'a mut Scheduler<Task>,
}

impl<'a, D: Document> PageContext<'a, D> {
    /// Bundle a document and scheduler
    pub fn new(document: &'a D, scheduler: &'a mut Scheduler<Task>) -> Self {
        Self {
            document,
            scheduler,
        }
    }
}
