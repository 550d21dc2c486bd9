//! Plugin instance assembly.

use std::sync::Arc;

use mindful_core::{
    Config, ConfigError, EngineFactory, HostParameters, Manifest, Result, ScriptFactory,
};

use crate::controller::Controller;
use crate::parameters::ParameterBank;
use crate::processor::Processor;
use crate::shared::{ParameterListener, Shared};

/// A plugin instance: one [`Processor`] for the audio thread and one
/// [`Controller`] for the control thread, sharing queues and flags.
///
/// # Example
///
/// ```ignore
/// let config = Config::new("Mindful", Category::MidiEffect);
/// let manifest = Manifest::parse(MANIFEST_JSON)?;
/// let instance = Instance::new(&config, manifest, MyEngine::new, MyScript::load)?;
/// let (processor, controller) = instance.into_parts();
/// ```
pub struct Instance<E: EngineFactory, S: ScriptFactory> {
    processor: Processor,
    controller: Controller<E, S>,
    host: Arc<dyn HostParameters>,
}

impl<E: EngineFactory, S: ScriptFactory> Instance<E, S> {
    /// Create an instance whose host parameters live in a [`ParameterBank`].
    pub fn new(config: &Config, manifest: Manifest, engines: E, scripts: S) -> Result<Self> {
        let infos = manifest.parameters.clone();
        Self::with_host(config, manifest, engines, scripts, move |listener| {
            Arc::new(ParameterBank::new(infos, listener))
        })
    }

    /// Create an instance backed by host-owned parameters.
    ///
    /// `make_host` receives the listener the host must call on every
    /// parameter change. The host must expose the manifest's parameters in
    /// manifest order.
    pub fn with_host(
        config: &Config,
        manifest: Manifest,
        engines: E,
        scripts: S,
        make_host: impl FnOnce(ParameterListener) -> Arc<dyn HostParameters>,
    ) -> Result<Self> {
        config.validate()?;

        let parameters = manifest.parameters;
        let shared = Arc::new(Shared::new(
            config.fifo_capacity,
            parameters.iter().map(|info| info.default_value),
        ));

        let host = make_host(ParameterListener::new(Arc::clone(&shared)));
        if host.count() != parameters.len() {
            return Err(ConfigError::Invalid(format!(
                "host exposes {} parameter(s), manifest declares {}",
                host.count(),
                parameters.len()
            )));
        }

        log::debug!(
            "Creating {} instance with {} parameter(s)",
            config.name,
            parameters.len()
        );

        let processor = Processor::new(
            Arc::clone(&shared),
            config.category,
            config.midi_output_slots,
        );
        let controller = Controller::new(
            shared,
            engines,
            scripts,
            parameters,
            Arc::clone(&host),
        );

        Ok(Self {
            processor,
            controller,
            host,
        })
    }

    /// The audio-thread half.
    pub fn processor_mut(&mut self) -> &mut Processor {
        &mut self.processor
    }

    /// The control-thread half.
    pub fn controller(&self) -> &Controller<E, S> {
        &self.controller
    }

    /// The control-thread half, mutably.
    pub fn controller_mut(&mut self) -> &mut Controller<E, S> {
        &mut self.controller
    }

    /// The host parameters.
    pub fn host(&self) -> &Arc<dyn HostParameters> {
        &self.host
    }

    /// Split into the halves to hand to each thread.
    pub fn into_parts(self) -> (Processor, Controller<E, S>) {
        (self.processor, self.controller)
    }
}
