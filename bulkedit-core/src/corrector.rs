//! The bulk attribute-correction sweep.
//!
//! The sweep is I/O-agnostic: catalog reads and writes go through the port traits and
//! every decision is pushed to the [`EventSink`] as it is made.

use crate::cancel::CancelFlag;
use crate::error::{ItemError, SweepError};
use crate::ports::{CatalogPorts, EventSink, SpecProvider};
use crate::settings::RunSettings;
use anyhow::Context;
use bulkedit_domain::{correct_term_set, correct_variation_attributes, validate_specs};
use bulkedit_types::catalog::{ProductSnapshot, VariationSnapshot};
use bulkedit_types::event::SweepEvent;
use bulkedit_types::ids::{ProductId, TermId};
use bulkedit_types::query::{Page, QueryFilters};
use bulkedit_types::report::{
    EntryStatus, EntryTarget, ExecutionReport, FailureStage, ItemFailure, ReportEntry,
    ReportRunInfo, ReportToolInfo,
};
use bulkedit_types::spec::CorrectionSpec;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Corrections made (or planned, in a dry run) on one product so far.
///
/// Later specs read from here before the catalog, so a dry run reports the same chain
/// of corrections a live run would apply.
#[derive(Default)]
struct ProductPlan {
    terms: HashMap<String, Vec<TermId>>,
    variations: HashMap<ProductId, BTreeMap<String, String>>,
}

/// Renames attribute values on variable products and their visible variations.
pub struct BulkAttributeCorrector<'a> {
    ports: CatalogPorts<'a>,
    specs: &'a dyn SpecProvider,
    sink: &'a dyn EventSink,
    cancel: CancelFlag,
    tool: ReportToolInfo,
}

impl<'a> BulkAttributeCorrector<'a> {
    pub fn new(
        ports: CatalogPorts<'a>,
        specs: &'a dyn SpecProvider,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            ports,
            specs,
            sink,
            cancel: CancelFlag::new(),
            tool: ReportToolInfo {
                name: "bulkedit".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Stop between products once `cancel` is set.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_tool(mut self, tool: ReportToolInfo) -> Self {
        self.tool = tool;
        self
    }

    /// Run the sweep with the specs from the injected provider.
    pub fn run(&self, settings: &RunSettings) -> Result<ExecutionReport, SweepError> {
        let specs = self
            .specs
            .specs()
            .context("load correction specs")
            .map_err(SweepError::Start)?;
        self.run_with_specs(settings, &specs)
    }

    /// Run the sweep with an explicit spec list.
    pub fn run_with_specs(
        &self,
        settings: &RunSettings,
        specs: &[CorrectionSpec],
    ) -> Result<ExecutionReport, SweepError> {
        validate_specs(specs)?;

        let clock = Instant::now();
        let mut report = ExecutionReport::new(
            self.tool.clone(),
            ReportRunInfo {
                run_id: Uuid::new_v4().to_string(),
                started_at: Utc::now().to_rfc3339(),
                ended_at: None,
                duration_ms: None,
            },
            settings.dry_run,
        );
        report.specs = specs.to_vec();

        let targets = settings.unique_targets();
        let first_page = if targets.is_empty() {
            let mut filters = settings.filters.clone();
            filters.extract_hints()?;
            filters.validate()?;
            debug!(hints = ?filters.hints, "query hints");
            let page = self
                .ports
                .query
                .page(&filters, filters.first_cursor())
                .context("fetch first product page")
                .map_err(SweepError::Start)?;
            Some((filters, page))
        } else {
            None
        };

        self.ports
            .products
            .begin_bulk()
            .context("begin bulk session")
            .map_err(SweepError::Start)?;

        info!(
            dry_run = settings.dry_run,
            specs = specs.len(),
            targets = targets.len(),
            "sweep started"
        );

        match first_page {
            None => {
                if self.visit_all(&targets, specs, settings.dry_run, &mut report).is_break() {
                    report.interrupted = true;
                }
            }
            Some((filters, page)) => {
                self.sweep_pages(&filters, page, specs, settings.dry_run, &mut report)
            }
        }

        if let Err(err) = self.ports.products.end_bulk() {
            self.fail(
                &mut report,
                ItemFailure {
                    product_id: None,
                    variation_id: None,
                    attribute_key: None,
                    stage: FailureStage::Persistence,
                    message: format!("end bulk session: {:#}", err),
                },
            );
        }

        report.run.ended_at = Some(Utc::now().to_rfc3339());
        report.run.duration_ms = Some(clock.elapsed().as_millis() as u64);

        info!(
            visited = report.counts.products_visited,
            parent_corrections = report.counts.parent_corrections,
            variation_corrections = report.counts.variation_corrections,
            failures = report.failures.len(),
            interrupted = report.interrupted,
            "sweep finished"
        );
        Ok(report)
    }

    fn sweep_pages(
        &self,
        filters: &QueryFilters,
        first: Page,
        specs: &[CorrectionSpec],
        dry_run: bool,
        report: &mut ExecutionReport,
    ) {
        let mut page = first;
        loop {
            debug!(ids = page.ids.len(), "product page");
            if self
                .visit_all(&page.ids, specs, dry_run, report)
                .is_break()
            {
                report.interrupted = true;
                return;
            }

            // An empty page with a cursor would never advance.
            let Some(cursor) = page.next.filter(|_| !page.ids.is_empty()) else {
                return;
            };

            match self.ports.query.page(filters, cursor) {
                Ok(next) => page = next,
                Err(err) => {
                    self.fail(
                        report,
                        ItemFailure {
                            product_id: None,
                            variation_id: None,
                            attribute_key: None,
                            stage: FailureStage::Query,
                            message: format!("fetch page at offset {}: {:#}", cursor.offset, err),
                        },
                    );
                    report.interrupted = true;
                    return;
                }
            }
        }
    }

    fn visit_all(
        &self,
        ids: &[ProductId],
        specs: &[CorrectionSpec],
        dry_run: bool,
        report: &mut ExecutionReport,
    ) -> ControlFlow<()> {
        for &id in ids {
            if self.cancel.is_cancelled() {
                warn!(product_id = %id, "sweep cancelled");
                return ControlFlow::Break(());
            }
            self.visit_product(id, specs, dry_run, report);
        }
        ControlFlow::Continue(())
    }

    fn visit_product(
        &self,
        id: ProductId,
        specs: &[CorrectionSpec],
        dry_run: bool,
        report: &mut ExecutionReport,
    ) {
        report.counts.products_visited += 1;

        let product = match self.load_product(id) {
            Ok(p) => p,
            Err(err) => {
                report.counts.products_skipped += 1;
                self.item_failure(report, Some(id), None, None, err);
                return;
            }
        };

        self.sink.on_event(&SweepEvent::ProductVisited {
            id,
            title: product.title.clone(),
        });

        if !product.kind.is_variable() {
            debug!(product_id = %id, kind = product.kind.as_str(), "not a variable product");
            report.counts.products_skipped += 1;
            self.sink.on_event(&SweepEvent::ProductSkipped {
                id,
                kind: product.kind,
            });
            return;
        }

        let mut plan = ProductPlan::default();
        for spec in specs {
            self.correct_parent(&product, spec, dry_run, &mut plan, report);
            self.correct_variations(&product, spec, dry_run, &mut plan, report);
        }
    }

    fn correct_parent(
        &self,
        product: &ProductSnapshot,
        spec: &CorrectionSpec,
        dry_run: bool,
        plan: &mut ProductPlan,
        report: &mut ExecutionReport,
    ) {
        let taxonomy = spec.taxonomy();

        let resolved = self
            .resolve_term(&taxonomy, &spec.old_value)
            .and_then(|old| Ok((old, self.resolve_term(&taxonomy, &spec.new_value)?)));
        let (old, new) = match resolved {
            Ok(pair) => pair,
            Err(err) => {
                self.item_failure(report, Some(product.id), None, Some(spec), err);
                return;
            }
        };

        let current = match plan.terms.get(&taxonomy) {
            Some(terms) => terms.clone(),
            None => match self.ports.terms.assigned(product.id, &taxonomy) {
                Ok(terms) => terms,
                Err(source) => {
                    let err = ItemError::AssignedTerms {
                        id: product.id,
                        taxonomy: taxonomy.clone(),
                        source,
                    };
                    self.item_failure(report, Some(product.id), None, Some(spec), err);
                    return;
                }
            },
        };

        let change = correct_term_set(&current, old, new);
        let status = if change.is_noop() {
            debug!(product_id = %product.id, taxonomy = %taxonomy, "terms already correct");
            EntryStatus::Unchanged
        } else if dry_run {
            EntryStatus::Planned
        } else {
            match self.write_terms(product.id, &taxonomy, &change.after) {
                Ok(()) => {
                    info!(
                        product_id = %product.id,
                        taxonomy = %taxonomy,
                        from = %spec.old_value,
                        to = %spec.new_value,
                        "parent terms corrected"
                    );
                    EntryStatus::Applied
                }
                Err(err) => {
                    self.item_failure(report, Some(product.id), None, Some(spec), err);
                    EntryStatus::Failed
                }
            }
        };
        if matches!(status, EntryStatus::Applied | EntryStatus::Planned) {
            plan.terms.insert(taxonomy, change.after);
        }

        self.entry(
            report,
            ReportEntry {
                product_id: product.id,
                variation_id: None,
                target: EntryTarget::Parent,
                attribute_key: spec.attribute_key.clone(),
                from: spec.old_value.clone(),
                to: spec.new_value.clone(),
                status,
            },
        );
    }

    fn write_terms(
        &self,
        id: ProductId,
        taxonomy: &str,
        terms: &[TermId],
    ) -> Result<(), ItemError> {
        self.ports
            .terms
            .assign(id, taxonomy, terms)
            .map_err(|source| ItemError::Write {
                id,
                what: "term assignment",
                source,
            })?;
        self.ports
            .products
            .invalidate_caches(id)
            .map_err(|source| ItemError::Write {
                id,
                what: "cache invalidation",
                source,
            })
    }

    fn correct_variations(
        &self,
        product: &ProductSnapshot,
        spec: &CorrectionSpec,
        dry_run: bool,
        plan: &mut ProductPlan,
        report: &mut ExecutionReport,
    ) {
        let key = spec.taxonomy();

        for &variation_id in &product.children {
            let variation = match self.load_variation(variation_id) {
                Ok(v) => v,
                Err(err) => {
                    self.item_failure(report, Some(product.id), Some(variation_id), Some(spec), err);
                    continue;
                }
            };

            let attributes = plan
                .variations
                .get(&variation_id)
                .cloned()
                .unwrap_or(variation.attributes);
            let from = attributes.get(&key).cloned().unwrap_or_default();
            let updated =
                correct_variation_attributes(&attributes, &key, &spec.old_value, &spec.new_value);

            let status = match &updated {
                None => EntryStatus::Unchanged,
                Some(_) if dry_run => EntryStatus::Planned,
                Some(attributes) => match self
                    .ports
                    .products
                    .save_variation_attributes(variation_id, attributes)
                {
                    Ok(()) => {
                        info!(
                            product_id = %product.id,
                            variation_id = %variation_id,
                            attribute = %key,
                            from = %spec.old_value,
                            to = %spec.new_value,
                            "variation corrected"
                        );
                        EntryStatus::Applied
                    }
                    Err(source) => {
                        let err = ItemError::Write {
                            id: variation_id,
                            what: "variation attributes",
                            source,
                        };
                        self.item_failure(
                            report,
                            Some(product.id),
                            Some(variation_id),
                            Some(spec),
                            err,
                        );
                        EntryStatus::Failed
                    }
                },
            };

            if let (Some(attributes), EntryStatus::Applied | EntryStatus::Planned) =
                (updated, status)
            {
                plan.variations.insert(variation_id, attributes);
            }

            let to = if status == EntryStatus::Unchanged {
                from.clone()
            } else {
                spec.new_value.clone()
            };
            self.entry(
                report,
                ReportEntry {
                    product_id: product.id,
                    variation_id: Some(variation_id),
                    target: EntryTarget::Variation,
                    attribute_key: spec.attribute_key.clone(),
                    from,
                    to,
                    status,
                },
            );
        }
    }

    fn load_product(&self, id: ProductId) -> Result<ProductSnapshot, ItemError> {
        match self.ports.products.load_product(id) {
            Ok(Some(p)) => Ok(p),
            Ok(None) => Err(ItemError::ProductNotFound { id }),
            Err(source) => Err(ItemError::Load { id, source }),
        }
    }

    fn load_variation(&self, id: ProductId) -> Result<VariationSnapshot, ItemError> {
        match self.ports.products.load_variation(id) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(ItemError::VariationNotFound { id }),
            Err(source) => Err(ItemError::Load { id, source }),
        }
    }

    fn resolve_term(&self, taxonomy: &str, slug: &str) -> Result<TermId, ItemError> {
        match self.ports.terms.resolve(taxonomy, slug) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(ItemError::TermNotFound {
                taxonomy: taxonomy.to_string(),
                slug: slug.to_string(),
            }),
            Err(source) => Err(ItemError::TermLookup {
                taxonomy: taxonomy.to_string(),
                slug: slug.to_string(),
                source,
            }),
        }
    }

    fn entry(&self, report: &mut ExecutionReport, entry: ReportEntry) {
        self.sink.on_event(&SweepEvent::Correction(entry.clone()));
        report.record_entry(entry);
    }

    fn item_failure(
        &self,
        report: &mut ExecutionReport,
        product_id: Option<ProductId>,
        variation_id: Option<ProductId>,
        spec: Option<&CorrectionSpec>,
        err: ItemError,
    ) {
        self.fail(
            report,
            ItemFailure {
                product_id,
                variation_id,
                attribute_key: spec.map(|s| s.attribute_key.clone()),
                stage: err.stage(),
                message: err.to_string(),
            },
        );
    }

    fn fail(&self, report: &mut ExecutionReport, failure: ItemFailure) {
        warn!(
            product_id = ?failure.product_id,
            variation_id = ?failure.variation_id,
            attribute = ?failure.attribute_key,
            stage = failure.stage.as_str(),
            "{}",
            failure.message
        );
        self.sink.on_event(&SweepEvent::Failure(failure.clone()));
        report.record_failure(failure);
    }
}
