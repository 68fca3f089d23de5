use crate::{
    backup::backup_document,
    config::DocumentPaths,
    diagnostics::{Diagnostics, Document, Issue},
    document::{read_object, write_document},
    enabled_list::{export_enabled_list, read_enabled_list, Blacklist},
    merge::{merge_import, MergeOptions},
    order::{
        apply_enabled_list, load_presentation_order, render_checklist, sort_by_display_name,
        string_list, SortDirection, ENABLED_ORDER_FIELD,
    },
    registry::{load_registry, ModId, Registry},
    writer::{write_enabled_order, write_gui_order},
};
use serde_json::{Map, Value};
use std::{fs, io, path::Path};

#[derive(Debug, Default, Clone)]
pub struct Documents {
    pub registry: Option<Map<String, Value>>,
    pub gui_order: Option<Map<String, Value>>,
    pub enabled_order: Option<Map<String, Value>>,
    pub ignore_list: Option<Map<String, Value>>,
}

impl Documents {
    pub fn read(paths: &DocumentPaths, diagnostics: &mut Diagnostics) -> Self {
        let ignore_list = if paths.ignore_list.exists() {
            read_or_report(&paths.ignore_list, Document::Blacklist, diagnostics)
        } else {
            None
        };
        Self {
            registry: read_or_report(&paths.registry, Document::Registry, diagnostics),
            gui_order: read_or_report(&paths.gui_order, Document::GuiOrder, diagnostics),
            enabled_order: read_or_report(&paths.enabled_order, Document::EnabledOrder, diagnostics),
            ignore_list,
        }
    }
}

fn read_or_report(
    path: &Path,
    document: Document,
    diagnostics: &mut Diagnostics,
) -> Option<Map<String, Value>> {
    match read_object(path) {
        Ok(map) => Some(map),
        Err(err) => {
            diagnostics.report(Issue::DocumentUnreadable {
                document,
                reason: err.to_string(),
            });
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub gui_order_written: bool,
    pub enabled_order_written: bool,
}

#[derive(Debug)]
pub struct Engine {
    paths: DocumentPaths,
    registry: Registry,
    blacklist: Blacklist,
    presentation_order: Vec<ModId>,
    gui_doc: Map<String, Value>,
    enabled_doc: Map<String, Value>,
    loaded_enabled_tokens: Option<Vec<String>>,
    signature_invalidated: bool,
    diagnostics: Diagnostics,
}

impl Engine {
    pub fn load(paths: DocumentPaths) -> Self {
        let mut diagnostics = Diagnostics::new();
        let documents = Documents::read(&paths, &mut diagnostics);
        Self::from_documents(paths, documents, diagnostics)
    }

    pub fn from_documents(
        paths: DocumentPaths,
        documents: Documents,
        mut diagnostics: Diagnostics,
    ) -> Self {
        let mut registry = match &documents.registry {
            Some(doc) => diagnostics.absorb(load_registry(doc)),
            None => Registry::new(),
        };

        let blacklist = match &documents.ignore_list {
            Some(doc) => {
                let records = diagnostics.absorb(read_enabled_list(doc, Document::Blacklist));
                Blacklist::from_records(&records)
            }
            None => Blacklist::new(),
        };

        let presentation_order = match &documents.gui_order {
            Some(doc) => diagnostics.absorb(load_presentation_order(doc)),
            None => Vec::new(),
        };

        let mut loaded_enabled_tokens = None;
        if let Some(doc) = &documents.enabled_order {
            diagnostics.absorb(apply_enabled_list(doc, &mut registry));
            loaded_enabled_tokens = string_list(doc, ENABLED_ORDER_FIELD, Document::EnabledOrder).ok();
        }

        diagnostics.log_info(format!(
            "Loaded {} mod(s), {} in GUI order, {} enabled, {} ignored",
            registry.len(),
            presentation_order.len(),
            registry.enabled_ids().len(),
            blacklist.len()
        ));

        Self {
            paths,
            registry,
            blacklist,
            presentation_order,
            gui_doc: documents.gui_order.unwrap_or_default(),
            enabled_doc: documents.enabled_order.unwrap_or_default(),
            loaded_enabled_tokens,
            signature_invalidated: false,
            diagnostics,
        }
    }

    pub fn paths(&self) -> &DocumentPaths {
        &self.paths
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn presentation_order(&self) -> &[ModId] {
        &self.presentation_order
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn enable_mod(&mut self, reference: &str) -> bool {
        self.set_enabled(reference, true)
    }

    pub fn disable_mod(&mut self, reference: &str) -> bool {
        self.set_enabled(reference, false)
    }

    fn set_enabled(&mut self, reference: &str, enabled: bool) -> bool {
        let Some(id) = self.registry.resolve(reference) else {
            self.diagnostics.report(Issue::UnresolvedReference {
                document: Document::Request,
                reference: reference.to_string(),
            });
            return false;
        };
        self.invalidate_signature();
        self.registry.set_enabled(id, enabled);
        let verb = if enabled { "Enabled" } else { "Disabled" };
        self.diagnostics
            .log_info(format!("{verb} {}", self.registry.display_name(id)));
        true
    }

    pub fn sort(&mut self, order: &mut Vec<ModId>, direction: SortDirection) {
        let issues = sort_by_display_name(order, &self.registry, direction);
        self.diagnostics.extend(issues);
    }

    pub fn export_enabled_list(
        &mut self,
        path: &Path,
        order: &[ModId],
        include_ignored: bool,
    ) -> Option<usize> {
        self.diagnostics
            .log_info(format!("Exporting mod list to {}", path.display()));
        let exported = self.diagnostics.absorb(export_enabled_list(
            order,
            &self.registry,
            &self.blacklist,
            include_ignored,
        ));
        for id in &exported.ignored {
            self.diagnostics
                .log_info(format!("(Ignored): {}", self.registry.display_name(*id)));
        }
        match write_document(path, &exported.records) {
            Ok(()) => Some(exported.records.len()),
            Err(err) => {
                self.diagnostics.report(Issue::WriteFailed {
                    document: Document::ExportList,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    /// An unreadable or rejected list returns `order` unchanged and leaves
    /// enablement alone.
    pub fn import_enabled_list(
        &mut self,
        path: &Path,
        order: &[ModId],
        options: MergeOptions,
    ) -> Vec<ModId> {
        self.diagnostics
            .log_info(format!("Importing mod list from {}", path.display()));
        let doc = match read_object(path) {
            Ok(doc) => doc,
            Err(err) => {
                self.diagnostics.report(Issue::DocumentUnreadable {
                    document: Document::ImportList,
                    reason: err.to_string(),
                });
                return order.to_vec();
            }
        };
        let records = self
            .diagnostics
            .absorb(read_enabled_list(&doc, Document::ImportList));
        let outcome = self.diagnostics.absorb(merge_import(
            &records,
            order,
            &mut self.registry,
            &self.blacklist,
            options,
        ));
        if outcome.enablement_changed {
            self.invalidate_signature();
        }
        outcome.order
    }

    pub fn checklist(&mut self, order: &[ModId]) -> Vec<String> {
        let lines = render_checklist(order, &self.registry);
        self.diagnostics.absorb(lines)
    }

    pub fn save(&mut self, order: &[ModId]) -> SaveReport {
        let issues = write_gui_order(&mut self.gui_doc, order, &self.registry);
        self.diagnostics.extend(issues);
        let gui_path = self.paths.gui_order.clone();
        let gui_order_written = self.write_order_document(&gui_path, Document::GuiOrder);

        let issues = write_enabled_order(&mut self.enabled_doc, order, &self.registry);
        self.diagnostics.extend(issues);
        let written_tokens =
            string_list(&self.enabled_doc, ENABLED_ORDER_FIELD, Document::EnabledOrder).ok();
        if written_tokens != self.loaded_enabled_tokens {
            self.invalidate_signature();
        }
        let enabled_path = self.paths.enabled_order.clone();
        let enabled_order_written = self.write_order_document(&enabled_path, Document::EnabledOrder);
        if enabled_order_written {
            self.loaded_enabled_tokens = written_tokens;
        }

        SaveReport {
            gui_order_written,
            enabled_order_written,
        }
    }

    fn write_order_document(&mut self, path: &Path, document: Document) -> bool {
        if self.paths.backup {
            match backup_document(path) {
                Ok(Some(target)) => self
                    .diagnostics
                    .log_info(format!("Backed up {document} to {}", target.display())),
                Ok(None) => {}
                Err(err) => self
                    .diagnostics
                    .log_warn(format!("Backup of {document} failed: {err:#}")),
            }
        }
        let doc = match document {
            Document::GuiOrder => &self.gui_doc,
            _ => &self.enabled_doc,
        };
        match write_document(path, doc) {
            Ok(()) => true,
            Err(err) => {
                self.diagnostics.report(Issue::WriteFailed {
                    document,
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    fn invalidate_signature(&mut self) {
        if self.signature_invalidated {
            return;
        }
        match fs::remove_file(&self.paths.signature) {
            Ok(()) => {
                self.signature_invalidated = true;
                self.diagnostics.log_info(format!(
                    "Invalidated cache signature {}",
                    self.paths.signature.display()
                ));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.signature_invalidated = true;
            }
            Err(err) => self.diagnostics.report(Issue::WriteFailed {
                document: Document::Signature,
                reason: format!("remove {}: {err}", self.paths.signature.display()),
            }),
        }
    }
}
