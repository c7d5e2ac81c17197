//! Proposal rendering
//!
//! Every page runs the whole pipeline before the next one starts:
//! guard escape, compile, guard restore, custom variables, line items.
//! Slot counters live for one document render, so slot indices are global
//! across pages.

use log::{debug, trace, warn};
use serde_json::Value;

use crate::compiler::TemplateCompiler;
use crate::config::EngineConfig;
use crate::context::build_context;
use crate::custom_vars::CustomVariableProcessor;
use crate::guard::EscapeGuard;
use crate::line_items::LineItemProcessor;
use crate::markup::diagnostic;
use crate::tokens::{BindingSlot, SlotCounters};
use crate::{Estimate, ProposalTemplate, RenderMode, Result, TemplateError, VariableMap};

/// Proposal renderer
///
/// Immutable once built; every render owns its own context, counters and
/// output buffer.
pub struct ProposalRenderer<'a> {
    /// The template to render
    template: &'a ProposalTemplate,
    config: EngineConfig,
    compiler: TemplateCompiler,
    guard: EscapeGuard,
    custom_variables: CustomVariableProcessor,
    line_items: LineItemProcessor,
}

impl<'a> ProposalRenderer<'a> {
    /// Create a renderer with the default configuration
    pub fn new(template: &'a ProposalTemplate) -> Result<Self> {
        Self::with_config(template, EngineConfig::default())
    }

    /// Create a renderer with an explicit configuration
    pub fn with_config(template: &'a ProposalTemplate, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            template,
            config,
            compiler: TemplateCompiler::new(),
            guard: EscapeGuard::new(),
            custom_variables: CustomVariableProcessor::new()?,
            line_items: LineItemProcessor::new()?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render the document using the values saved on the estimate
    pub fn render(&self, estimate: &Estimate, mode: RenderMode) -> String {
        self.render_with_variables(estimate, mode, &estimate.custom_variables)
    }

    /// Render the document against an explicit set of saved values
    pub fn render_with_variables(
        &self,
        estimate: &Estimate,
        mode: RenderMode,
        variables: &VariableMap,
    ) -> String {
        let sources = self.template.page_sources();
        let (context, nonce) = self.prepare(&sources, estimate);
        let limits = &self.config.limits;
        let mut assembly = DocumentAssembly::new();

        debug!("Rendering {} page(s) in {:?} mode", sources.len(), mode);

        for (index, source) in sources.iter().take(limits.max_pages).enumerate() {
            assembly.begin_page(index);
            let compiled = match self.compile_page(index, source, &context, &nonce) {
                Ok(html) => html,
                Err(e) => {
                    warn!("Page {} skipped: {e}", index + 1);
                    assembly.finish_page(diagnostic(&e.to_string()));
                    continue;
                }
            };

            let counters = assembly.begin_binding();
            let html = self
                .custom_variables
                .process(&compiled, mode, variables, counters, limits);
            let html = self
                .line_items
                .process(&html, estimate, mode, variables, counters, limits);
            assembly.finish_page(html);
        }

        if let Some(message) = self.page_overflow(sources.len()) {
            assembly.append(&diagnostic(&message));
        }

        assembly.join(&self.config.page_break)
    }

    /// Every bound slot of the document in render order
    ///
    /// Runs the same compile-and-count pipeline as
    /// [`render`](Self::render), so the keys line up with the rendered
    /// controls.
    pub fn binding_slots(&self, estimate: &Estimate) -> Vec<BindingSlot> {
        let sources = self.template.page_sources();
        let (context, nonce) = self.prepare(&sources, estimate);
        let limits = &self.config.limits;
        let mut counters = SlotCounters::new();
        let mut slots = Vec::new();

        for (index, source) in sources.iter().take(limits.max_pages).enumerate() {
            let Ok(compiled) = self.compile_page(index, source, &context, &nonce) else {
                continue;
            };

            // Custom variables bind first, so they claim the limit first
            let mut page_slots = self
                .custom_variables
                .slots(&compiled, index, &mut counters, limits);
            page_slots.extend(self.line_items.slots(&compiled, index, &mut counters, limits));
            page_slots.sort_by_key(|(offset, _)| *offset);

            slots.extend(page_slots.into_iter().map(|(_, slot)| slot));
        }

        slots
    }

    /// Build the render context and a marker nonce absent from it and
    /// from every page
    fn prepare(&self, sources: &[&str], estimate: &Estimate) -> (Value, String) {
        let context = EscapeGuard::sanitize(build_context(estimate));
        let context_text = context.to_string();

        let mut haystacks = sources.to_vec();
        haystacks.push(&context_text);
        let nonce = EscapeGuard::nonce(&haystacks);

        (context, nonce)
    }

    /// Compile one page and restore its protected tokens
    fn compile_page(
        &self,
        index: usize,
        source: &str,
        context: &Value,
        nonce: &str,
    ) -> Result<String> {
        let limits = &self.config.limits;

        if source.len() > limits.max_page_bytes {
            return Err(TemplateError::RenderError(format!(
                "page {} source is {} bytes, limit is {}",
                index + 1,
                source.len(),
                limits.max_page_bytes
            )));
        }

        debug!("Compiling page {} ({} bytes)", index + 1, source.len());
        let escaped = self.guard.escape(source, nonce);
        let compiled = self.compiler.compile(&escaped, context);

        if compiled.len() > limits.max_output_bytes {
            return Err(TemplateError::RenderError(format!(
                "page {} output is {} bytes, limit is {}",
                index + 1,
                compiled.len(),
                limits.max_output_bytes
            )));
        }

        let compiled = self.guard.neutralize(&compiled);
        Ok(self.guard.restore(&compiled, nonce))
    }

    fn page_overflow(&self, page_count: usize) -> Option<String> {
        let max_pages = self.config.limits.max_pages;
        (page_count > max_pages).then(|| {
            warn!("Template has {page_count} pages, rendering the first {max_pages}");
            format!("document has {page_count} pages, only the first {max_pages} were rendered")
        })
    }
}

/// Assembly progress of one document render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    NotStarted,
    /// Compiling the page at this index
    PerPageCompiling(usize),
    /// Binding custom variables and line items on the page at this index
    PerPageVariableBinding(usize),
    Joined,
}

/// Page outputs and slot counters of one document render
#[derive(Debug)]
pub struct DocumentAssembly {
    state: AssemblyState,
    counters: SlotCounters,
    pages: Vec<String>,
}

impl DocumentAssembly {
    /// Start a document with fresh counters
    pub fn new() -> Self {
        Self {
            state: AssemblyState::NotStarted,
            counters: SlotCounters::new(),
            pages: Vec::new(),
        }
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    /// Enter compilation of the next page
    pub fn begin_page(&mut self, index: usize) {
        self.transition(AssemblyState::PerPageCompiling(index));
    }

    /// Enter binding of the current page and hand out the document counters
    pub fn begin_binding(&mut self) -> &mut SlotCounters {
        if let AssemblyState::PerPageCompiling(index) = self.state {
            self.transition(AssemblyState::PerPageVariableBinding(index));
        }
        &mut self.counters
    }

    /// Store the finished output of the current page
    pub fn finish_page(&mut self, html: String) {
        self.pages.push(html);
    }

    /// Append a fragment to the last page, or start a page for it
    pub fn append(&mut self, html: &str) {
        match self.pages.last_mut() {
            Some(page) => page.push_str(html),
            None => self.pages.push(html.to_string()),
        }
    }

    /// Join the page outputs with the page break
    pub fn join(mut self, page_break: &str) -> String {
        self.transition(AssemblyState::Joined);
        debug!("Joining {} page(s)", self.pages.len());
        self.pages.join(page_break)
    }

    fn transition(&mut self, next: AssemblyState) {
        trace!("Assembly {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl Default for DocumentAssembly {
    fn default() -> Self {
        Self::new()
    }
}
