//! Compilation of ChannelML documents into a [`Library`] of channel, synapse
//! and ion pool models.

use std::{collections::HashMap, path::Path};
use log::warn;
use crate::document::{Element, read_document};
use crate::error::{ChannelTablesError, Locate};
use crate::settings::CompilerSettings;
use crate::units::UnitScale;
pub mod channel;
pub mod pool;
pub mod synapse;
use channel::ChannelModel;
use pool::IonPool;
use synapse::SynapseModel;


/// Models compiled from one or more documents keyed by name
#[derive(Debug, Clone, Default)]
pub struct Library {
    channels: HashMap<String, ChannelModel>,
    synapses: HashMap<String, SynapseModel>,
    pools: HashMap<String, IonPool>,
}

impl Library {
    /// Creates an empty library
    pub fn new() -> Self {
        Library::default()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelModel> {
        self.channels.get(name)
    }

    pub fn synapse(&self, name: &str) -> Option<&SynapseModel> {
        self.synapses.get(name)
    }

    pub fn pool(&self, name: &str) -> Option<&IonPool> {
        self.pools.get(name)
    }

    pub fn channels(&self) -> &HashMap<String, ChannelModel> {
        &self.channels
    }

    pub fn synapses(&self) -> &HashMap<String, SynapseModel> {
        &self.synapses
    }

    pub fn pools(&self) -> &HashMap<String, IonPool> {
        &self.pools
    }

    /// Total number of models
    pub fn len(&self) -> usize {
        self.channels.len() + self.synapses.len() + self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a channel, replacing any channel with the same name
    pub fn insert_channel(&mut self, channel: ChannelModel) {
        if self.channels.contains_key(&channel.name) {
            warn!("channel {} is redefined", channel.name);
        }
        self.channels.insert(channel.name.clone(), channel);
    }

    /// Adds a synapse, replacing any synapse with the same name
    pub fn insert_synapse(&mut self, synapse: SynapseModel) {
        if self.synapses.contains_key(&synapse.name) {
            warn!("synapse {} is redefined", synapse.name);
        }
        self.synapses.insert(synapse.name.clone(), synapse);
    }

    /// Adds an ion pool, replacing any pool with the same name
    pub fn insert_pool(&mut self, pool: IonPool) {
        if self.pools.contains_key(&pool.name) {
            warn!("ion pool {} is redefined", pool.name);
        }
        self.pools.insert(pool.name.clone(), pool);
    }

    /// Adds every model of another library, models in `other` win on name clashes
    pub fn extend(&mut self, other: Library) {
        other.channels.into_values().for_each(|channel| self.insert_channel(channel));
        other.synapses.into_values().for_each(|synapse| self.insert_synapse(synapse));
        other.pools.into_values().for_each(|pool| self.insert_pool(pool));
    }
}

/// Compiles every `channel_type`, `synapse_type` and `ion_concentration` below
/// the root element in document order, using the unit system named by the root
/// `units` attribute, the first failure aborts the whole document
pub fn compile_document(
    root: &Element,
    settings: &CompilerSettings,
) -> Result<Library, ChannelTablesError> {
    settings.check()?;
    let units = UnitScale::from_tag(root.required_attribute("units")?)?;

    let mut library = Library::new();

    for element in root.descendants_named("channel_type") {
        let name = element.attribute("name").unwrap_or("unnamed");
        let channel = ChannelModel::from_element(element, &units, settings)
            .within(|| format!("channel '{}'", name))?;

        library.insert_channel(channel);
    }

    for element in root.descendants_named("synapse_type") {
        let name = element.attribute("name").unwrap_or("unnamed");
        let synapse = SynapseModel::from_element(element, &units)
            .within(|| format!("synapse '{}'", name))?;

        library.insert_synapse(synapse);
    }

    for element in root.descendants_named("ion_concentration") {
        let name = element.attribute("name").unwrap_or("unnamed");
        let pool = IonPool::from_element(element, &units)
            .within(|| format!("ion pool '{}'", name))?;

        library.insert_pool(pool);
    }

    Ok(library)
}

/// Parses XML text and compiles it with [`compile_document`]
pub fn compile_str(text: &str, settings: &CompilerSettings) -> Result<Library, ChannelTablesError> {
    compile_document(&Element::from_xml(text)?, settings)
}

/// Reads an XML file and compiles it with [`compile_document`]
pub fn compile_file<P: AsRef<Path>>(
    path: P,
    settings: &CompilerSettings,
) -> Result<Library, ChannelTablesError> {
    compile_document(&read_document(path)?, settings)
}
