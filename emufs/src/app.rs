//! Process-wide wiring done once when the application starts.

use crate::compat::CompatTree;
use crate::config::{AbiConfig, StorageConfig};
use crate::process::{AbiSupport, ProcessIdentifier};
use crate::tree::DocumentTree;
use crate::Context;

pub struct Application {
    documents: DocumentTree,
    process: ProcessIdentifier,
    abis: AbiSupport,
}

impl Application {
    /// Build everything from the configuration visible to `ctx`.
    ///
    /// The storage root is optional at this point, callers that only learn it
    /// later can set it through [Application::documents_mut].
    pub fn init(ctx: &dyn Context) -> crate::Result<Self> {
        Self::init_with(ctx, ProcessIdentifier::system())
    }

    pub fn init_with(ctx: &dyn Context, process: ProcessIdentifier) -> crate::Result<Self> {
        let storage = StorageConfig::from_context(ctx)?;
        let mut documents = DocumentTree::new(storage.package);
        if let Some(root) = &storage.root {
            documents.set_root(root)?;
        }

        let abis = AbiSupport::from_context(ctx, &AbiConfig::from_context(ctx)?);

        let app = Self {
            documents,
            process,
            abis,
        };
        app.log_device_info();
        Ok(app)
    }

    pub fn documents(&self) -> &DocumentTree {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut DocumentTree {
        &mut self.documents
    }

    /// The sentinel returning view handed to native code
    pub fn compat_documents(&self) -> CompatTree<'_> {
        CompatTree::new(&self.documents)
    }

    pub fn process(&self) -> &ProcessIdentifier {
        &self.process
    }

    pub fn abis(&self) -> &AbiSupport {
        &self.abis
    }

    pub fn is_main_process(&self) -> bool {
        self.process.is_main_process(self.documents.package())
    }

    fn log_device_info(&self) {
        log::info!(
            "process: {}",
            self.process.current_process_name().unwrap_or("<unknown>")
        );
        log::info!("supported ABIs: {}", self.abis.supported().join(", "));
        log::info!(
            "64-bit: {}, x86: {}",
            self.abis.supports_64_bit(),
            self.abis.supports_x86()
        );
        match self.documents.root() {
            Some(root) => log::info!("storage root: {}", root.display()),
            None => log::info!("storage root not set yet"),
        }
    }
}
