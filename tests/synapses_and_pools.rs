#[cfg(test)]
mod tests {
    use channel_tables::error::{ChannelTablesError, ConfigurationError};
    use channel_tables::library::compile_str;
    use channel_tables::settings::CompilerSettings;


    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() <= 1e-12 * expected.abs().max(1e-30)
    }

    #[test]
    pub fn test_double_exponential_synapse() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="Physiological Units">
                <synapse_type name="AMPA">
                    <doub_exp_syn max_conductance="1e-5" rise_time="1" decay_time="5" reversal_potential="0"/>
                </synapse_type>
                <synapse_type name="GABA">
                    <doub_exp_syn max_conductance="2e-5" rise_time="2" decay_time="20" reversal_potential="-70"/>
                </synapse_type>
            </channelml>
        "#;

        let library = compile_str(document, &CompilerSettings::default())?;

        assert_eq!(library.synapses().len(), 2);
        assert_eq!(library.len(), 2);

        let ampa = library.synapse("AMPA").expect("synapse should be compiled");
        assert!(close(ampa.max_conductance, 1e-8));
        assert!(close(ampa.rise_time, 1e-3));
        assert!(close(ampa.decay_time, 5e-3));
        assert_eq!(ampa.reversal_potential, 0.);
        assert!(!ampa.graded);
        assert!(!ampa.mg_block);

        let gaba = library.synapse("GABA").expect("synapse should be compiled");
        assert!(close(gaba.reversal_potential, -0.07));
        assert!(close(gaba.decay_time, 0.02));

        Ok(())
    }

    #[test]
    pub fn test_calcium_pool() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="Physiological Units">
                <ion_concentration name="CaPool">
                    <ion_species name="ca"/>
                    <decaying_pool_model resting_conc="7.55e-11" decay_constant="13.33">
                        <pool_volume_info shell_thickness="2e-5"/>
                    </decaying_pool_model>
                </ion_concentration>
            </channelml>
        "#;

        let library = compile_str(document, &CompilerSettings::default())?;

        let pool = library.pool("CaPool").expect("pool should be compiled");
        assert_eq!(pool.ion_species.as_deref(), Some("ca"));
        assert!(close(pool.resting_conc, 7.55e-5));
        assert!(close(pool.decay_constant, 0.01333));
        assert!(close(pool.shell_thickness, 2e-7));

        Ok(())
    }

    #[test]
    pub fn test_pool_without_species() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="SI Units">
                <ion_concentration name="Pool">
                    <decaying_pool_model resting_conc="0.05" decay_constant="0.02">
                        <pool_volume_info shell_thickness="1e-7"/>
                    </decaying_pool_model>
                </ion_concentration>
            </channelml>
        "#;

        let library = compile_str(document, &CompilerSettings::default())?;

        let pool = library.pool("Pool").expect("pool should be compiled");
        assert!(pool.ion_species.is_none());
        assert_eq!(pool.resting_conc, 0.05);
        assert_eq!(pool.decay_constant, 0.02);
        assert_eq!(pool.shell_thickness, 1e-7);

        Ok(())
    }

    #[test]
    pub fn test_non_calcium_pool_is_rejected() {
        let document = r#"
            <channelml units="SI Units">
                <ion_concentration name="NaPool">
                    <ion_species name="na"/>
                    <decaying_pool_model resting_conc="0.05" decay_constant="0.02">
                        <pool_volume_info shell_thickness="1e-7"/>
                    </decaying_pool_model>
                </ion_concentration>
            </channelml>
        "#;

        let error = compile_str(document, &CompilerSettings::default())
            .expect_err("sodium pools are not supported");

        assert_eq!(
            error.root_cause(),
            &ChannelTablesError::ConfigurationRelatedError(
                ConfigurationError::UnsupportedIonSpecies(String::from("na"))
            )
        );
        assert_eq!(error.locations(), vec!["ion pool 'NaPool'"]);
    }

    #[test]
    pub fn test_missing_pool_volume() {
        let document = r#"
            <channelml units="SI Units">
                <ion_concentration name="Pool">
                    <decaying_pool_model resting_conc="0.05" decay_constant="0.02"/>
                </ion_concentration>
            </channelml>
        "#;

        let error = compile_str(document, &CompilerSettings::default())
            .expect_err("pool volume is required");

        assert_eq!(
            error.root_cause(),
            &ChannelTablesError::ConfigurationRelatedError(ConfigurationError::MissingElement {
                parent: String::from("decaying_pool_model"),
                element: String::from("pool_volume_info"),
            })
        );
    }

    #[test]
    pub fn test_mixed_document() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="SI Units">
                <synapse_type name="Syn">
                    <doub_exp_syn max_conductance="1e-9" rise_time="0.001" decay_time="0.005" reversal_potential="0"/>
                </synapse_type>
                <ion_concentration name="Pool">
                    <ion_species name="ca"/>
                    <decaying_pool_model resting_conc="0.05" decay_constant="0.02">
                        <pool_volume_info shell_thickness="1e-7"/>
                    </decaying_pool_model>
                </ion_concentration>
                <channel_type name="Leak">
                    <current_voltage_relation cond_law="ohmic" ion="non_specific" default_gmax="0.3" default_erev="-0.054"/>
                </channel_type>
            </channelml>
        "#;

        let library = compile_str(document, &CompilerSettings::default())?;

        assert_eq!(library.len(), 3);
        assert!(library.channel("Leak").is_some());
        assert!(library.synapse("Syn").is_some());
        assert!(library.pool("Pool").is_some());
        assert!(library.channel("Syn").is_none());

        Ok(())
    }

    #[test]
    pub fn test_redefinition_replaces_model() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="SI Units">
                <synapse_type name="Syn">
                    <doub_exp_syn max_conductance="1" rise_time="1" decay_time="1" reversal_potential="0"/>
                </synapse_type>
                <synapse_type name="Syn">
                    <doub_exp_syn max_conductance="2" rise_time="1" decay_time="1" reversal_potential="0"/>
                </synapse_type>
            </channelml>
        "#;

        let mut library = compile_str(document, &CompilerSettings::default())?;

        assert_eq!(library.synapses().len(), 1);
        assert_eq!(library.synapse("Syn").map(|synapse| synapse.max_conductance), Some(2.));

        let other = compile_str(
            r#"<channelml units="SI Units">
                <synapse_type name="Syn">
                    <doub_exp_syn max_conductance="3" rise_time="1" decay_time="1" reversal_potential="0"/>
                </synapse_type>
            </channelml>"#,
            &CompilerSettings::default(),
        )?;
        library.extend(other);

        assert_eq!(library.synapse("Syn").map(|synapse| synapse.max_conductance), Some(3.));

        Ok(())
    }
}
