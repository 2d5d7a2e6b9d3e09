use log::info;
use crate::document::Element;
use crate::error::ConfigurationError;
use crate::units::UnitScale;


/// A decaying calcium pool in a shell below the membrane, values are in SI units
#[derive(Debug, Clone, PartialEq)]
pub struct IonPool {
    pub name: String,
    /// Declared ion species if any
    pub ion_species: Option<String>,
    /// Resting concentration (mol/m^3)
    pub resting_conc: f64,
    /// Decay time constant (s)
    pub decay_constant: f64,
    /// Shell thickness (m)
    pub shell_thickness: f64,
}

impl IonPool {
    /// Reads an `ion_concentration` element, a declared `ion_species` must be a calcium species
    pub fn from_element(element: &Element, units: &UnitScale) -> Result<Self, ConfigurationError> {
        let ion_species = match element.child("ion_species") {
            Some(species) => {
                let species_name = species.required_attribute("name")?;
                if !species_name.contains("ca") {
                    return Err(ConfigurationError::UnsupportedIonSpecies(String::from(species_name)));
                }

                Some(String::from(species_name))
            },
            None => None,
        };

        let name = element.required_attribute("name")?;
        let model = element.required_child("decaying_pool_model")?;
        let volume = model.required_child("pool_volume_info")?;

        let pool = IonPool {
            name: String::from(name),
            ion_species,
            resting_conc: units.normalize_concentration(model.parse_f64("resting_conc")?),
            decay_constant: units.normalize_time(model.parse_f64("decay_constant")?),
            shell_thickness: units.normalize_length(volume.parse_f64("shell_thickness")?),
        };

        info!("loading ion pool {} into library", name);

        Ok(pool)
    }
}
