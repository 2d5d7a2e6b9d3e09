#[cfg(test)]
mod tests {
    use channel_tables::error::{ChannelTablesError, ConfigurationError, EvaluationError};
    use channel_tables::library::{
        compile_document, compile_str,
        channel::{ConductanceLaw, GateIndex, GateSlot},
    };
    use channel_tables::document::Element;
    use channel_tables::settings::CompilerSettings;
    use channel_tables::tables::GateTable;


    const HH_CHANNEL: &str = r#"
        <channelml xmlns="http://morphml.org/channelml/schema" units="Physiological Units">
            <channel_type name="HHChannel">
                <current_voltage_relation cond_law="ohmic" ion="na" default_gmax="120" default_erev="50">
                    <gate name="m" instances="3">
                        <transition name="alpha" expr_form="exponential" rate="1" midpoint="-40" scale="10"/>
                        <transition name="beta" expr_form="sigmoid" rate="1" midpoint="-40" scale="-10"/>
                    </gate>
                </current_voltage_relation>
            </channel_type>
        </channelml>
    "#;

    const CALCIUM_CHANNEL: &str = r#"
        <channelml units="SI Units">
            <channel_type name="KCa">
                <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="100" default_erev="-0.08">
                    <conc_dependence name="Calcium" ion="ca" variable_name="ca_conc" min_conc="0" max_conc="0.01"/>
                    <q10_settings q10_factor="3" experimental_temp="16.3"/>
                    <gate name="c" instances="1">
                        <transition name="alpha" expr_form="generic" expr="2.5e5 * ca_conc * exp(v / 0.024)"/>
                        <transition name="beta" expr_form="generic" expr="v > 0 ? 1000 : 1000 * exp(-v / 0.024)"/>
                    </gate>
                </current_voltage_relation>
            </channel_type>
        </channelml>
    "#;

    fn relative_difference(actual: f64, expected: f64) -> f64 {
        (actual - expected).abs() / expected.abs().max(1e-300)
    }

    #[test]
    pub fn test_hodgkin_huxley_channel() -> Result<(), ChannelTablesError> {
        let library = compile_str(HH_CHANNEL, &CompilerSettings::default())?;

        let channel = library.channel("HHChannel").expect("channel should be compiled");

        assert_eq!(channel.conductance_law, ConductanceLaw::Ohmic);
        assert!(relative_difference(channel.gmax.expect("ohmic channel has gmax"), 1200.) < 1e-12);
        assert!(relative_difference(channel.erev.expect("ohmic channel has erev"), 0.05) < 1e-12);
        assert_eq!(channel.ion.as_deref(), Some("na"));
        assert!(channel.ion_dependency.is_none());
        assert_eq!(channel.gates.len(), 1);

        let gate = &channel.gates[0];
        assert_eq!(gate.name, "m");
        assert_eq!(gate.slot, GateSlot::X);
        assert_eq!(gate.power, 3.);
        assert_eq!(gate.q10, 1.);
        assert_eq!(gate.index, GateIndex::Voltage);
        assert!(gate.use_interpolation);

        let table = match &gate.table {
            GateTable::OneDimensional(table) => table,
            GateTable::TwoDimensional(_) => panic!("voltage gate should have a one dimensional table"),
        };

        assert_eq!(table.table_a.len(), 201);
        assert_eq!(table.table_b.len(), 201);
        assert!(relative_difference(table.voltage.min, -0.1) < 1e-12);
        assert!(relative_difference(table.voltage.max, 0.1) < 1e-12);

        // v = -100 mV
        let alpha = ((-100_f64 + 40.) / 10.).exp();
        let beta = 1. / (1. + ((-100_f64 + 40.) / -10.).exp());

        assert!(relative_difference(table.table_a[0], alpha / 1e-3) < 1e-9);
        assert!(relative_difference(table.table_b[0], (alpha + beta) / 1e-3) < 1e-9);

        // v = 0 mV
        let alpha = 4_f64.exp();
        let beta = 1. / (1. + (-4_f64).exp());

        assert!(relative_difference(table.table_a[100], alpha / 1e-3) < 1e-9);
        assert!(relative_difference(table.table_b[100], (alpha + beta) / 1e-3) < 1e-9);

        Ok(())
    }

    #[test]
    pub fn test_concentration_dependent_channel() -> Result<(), ChannelTablesError> {
        let library = compile_str(CALCIUM_CHANNEL, &CompilerSettings::default())?;

        let channel = library.channel("KCa").expect("channel should be compiled");

        assert_eq!(channel.ion_dependency.as_deref(), Some("ca"));
        let dependence = channel.concentration_dependence.as_ref().expect("channel depends on calcium");
        assert_eq!(dependence.variable_name, "ca_conc");
        assert_eq!(dependence.axis.divisions, 100);

        let gate = channel.gate("c").expect("gate should be compiled");
        assert_eq!(gate.index, GateIndex::VoltageConcentration);
        assert!(relative_difference(gate.q10, 3_f64.powf(-1.)) < 1e-12);

        let table = match &gate.table {
            GateTable::TwoDimensional(table) => table,
            GateTable::OneDimensional(_) => panic!("calcium gate should have a two dimensional table"),
        };

        assert_eq!(table.table_a.nrows(), 201);
        assert_eq!(table.table_a.ncols(), 101);
        assert_eq!(table.table_b.nrows(), 201);
        assert_eq!(table.table_b.ncols(), 101);
        assert!(table.table_a.rows().into_iter().all(|row| row.len() == 101));
        assert!(table.table_a.iter().zip(table.table_b.iter()).all(|(a, b)| b >= a));

        // zero concentration
        assert_eq!(table.table_a[[0, 0]], 0.);

        // v = -0.1 V, ca = 0.01 mol/m^3, rates are multiplied by the q10 factor
        let q10 = gate.q10;
        let alpha = 2.5e5 * 0.01 * (-0.1_f64 / 0.024).exp() * q10;
        let beta = 1000. * (0.1_f64 / 0.024).exp() * q10;

        assert!(relative_difference(table.table_a[[0, 100]], alpha) < 1e-9);
        assert!(relative_difference(table.table_b[[0, 100]], alpha + beta) < 1e-9);

        Ok(())
    }

    #[test]
    pub fn test_configured_concentration_divisions() -> Result<(), ChannelTablesError> {
        let settings = CompilerSettings { conc_divisions: 10, v_divisions: 20, ..CompilerSettings::default() };
        let library = compile_str(CALCIUM_CHANNEL, &settings)?;

        match &library.channel("KCa").expect("channel should be compiled").gates[0].table {
            GateTable::TwoDimensional(table) => assert_eq!(table.table_a.dim(), (21, 11)),
            GateTable::OneDimensional(_) => panic!("calcium gate should have a two dimensional table"),
        }

        Ok(())
    }

    #[test]
    pub fn test_table_settings_and_offset() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="Physiological Units">
                <channel_type name="Shifted">
                    <impl_prefs>
                        <table_settings max_v="50" min_v="-50" table_divisions="100"/>
                    </impl_prefs>
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="36" default_erev="-77">
                        <offset value="10"/>
                        <gate name="n" instances="4">
                            <time_course expr_form="generic" expr="1"/>
                            <steady_state expr_form="generic" expr="v"/>
                        </gate>
                    </current_voltage_relation>
                </channel_type>
            </channelml>
        "#;

        let library = compile_str(document, &CompilerSettings::default())?;
        let gate = &library.channel("Shifted").expect("channel should be compiled").gates[0];

        let table = match &gate.table {
            GateTable::OneDimensional(table) => table,
            GateTable::TwoDimensional(_) => panic!("voltage gate should have a one dimensional table"),
        };

        assert_eq!(table.table_a.len(), 101);
        assert!(relative_difference(table.voltage.min, -0.05) < 1e-12);
        assert!(relative_difference(table.voltage.max, 0.05) < 1e-12);
        // first sample is taken at min_v - offset = -60 mV
        assert!(relative_difference(table.table_a[0], -60. / 1e-3) < 1e-12);
        assert!(relative_difference(table.table_b[0], 1. / 1e-3) < 1e-12);

        Ok(())
    }

    #[test]
    pub fn test_q10_settings() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="SI Units">
                <channel_type name="Q10Channel">
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="1" default_erev="0">
                        <q10_settings q10_factor="3" experimental_temp="6.3"/>
                        <q10_settings gate="y" fixed_q10="5"/>
                        <q10_settings q10_factor="2" experimental_temp="16.3"/>
                        <gate name="x" instances="1">
                            <time_course expr_form="generic" expr="1"/>
                            <steady_state expr_form="generic" expr="temp_adj_x"/>
                        </gate>
                        <gate name="y" instances="1">
                            <time_course expr_form="generic" expr="1"/>
                            <steady_state expr_form="generic" expr="celsius"/>
                        </gate>
                    </current_voltage_relation>
                </channel_type>
            </channelml>
        "#;

        let settings = CompilerSettings { temperature: 26.3, ..CompilerSettings::default() };
        let library = compile_str(document, &settings)?;
        let channel = library.channel("Q10Channel").expect("channel should be compiled");

        // later global settings override earlier ones
        let x = channel.gate_in_slot(GateSlot::X).expect("x gate should be compiled");
        assert!(relative_difference(x.q10, 2.) < 1e-12);

        // gate specific setting ends the search
        let y = channel.gate_in_slot(GateSlot::Y).expect("y gate should be compiled");
        assert_eq!(y.q10, 5.);

        // tau = 1 / q10 so table b = q10 and table a = inf * q10
        match (&x.table, &y.table) {
            (GateTable::OneDimensional(x_table), GateTable::OneDimensional(y_table)) => {
                assert!(relative_difference(x_table.table_b[0], 2.) < 1e-12);
                assert!(relative_difference(x_table.table_a[0], 4.) < 1e-12);
                assert!(relative_difference(y_table.table_b[0], 5.) < 1e-12);
                assert!(relative_difference(y_table.table_a[0], 26.3 * 5.) < 1e-12);
            },
            _ => panic!("voltage gates should have one dimensional tables"),
        }

        Ok(())
    }

    #[test]
    pub fn test_parameters_in_expressions() -> Result<(), ChannelTablesError> {
        let document = r#"
            <channelml units="SI Units">
                <channel_type name="Parameterized">
                    <parameters>
                        <parameter name="shift" value="0.25"/>
                    </parameters>
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="1" default_erev="0">
                        <gate name="h" instances="1">
                            <transition name="alpha" expr_form="generic" expr="shift"/>
                            <transition name="beta" expr_form="generic" expr="1 - shift"/>
                        </gate>
                    </current_voltage_relation>
                </channel_type>
            </channelml>
        "#;

        let library = compile_str(document, &CompilerSettings::default())?;
        let gate = &library.channel("Parameterized").expect("channel should be compiled").gates[0];

        match &gate.table {
            GateTable::OneDimensional(table) => {
                assert!(table.table_a.iter().all(|a| (a - 0.25).abs() < 1e-12));
                assert!(table.table_b.iter().all(|b| (b - 1.).abs() < 1e-12));
            },
            GateTable::TwoDimensional(_) => panic!("voltage gate should have a one dimensional table"),
        }

        Ok(())
    }

    #[test]
    pub fn test_non_ohmic_channel() -> Result<(), ChannelTablesError> {
        let root = Element::new("channelml")
            .with_attribute("units", "SI Units")
            .with_child(
                Element::new("channel_type")
                    .with_attribute("name", "GHK")
                    .with_child(
                        Element::new("current_voltage_relation")
                            .with_attribute("cond_law", "ghk")
                    )
            );

        let library = compile_document(&root, &CompilerSettings::default())?;
        let channel = library.channel("GHK").expect("channel should be compiled");

        assert_eq!(channel.conductance_law, ConductanceLaw::Other(String::from("ghk")));
        assert!(channel.gmax.is_none());
        assert!(channel.erev.is_none());
        assert!(channel.gates.is_empty());

        Ok(())
    }

    #[test]
    pub fn test_too_many_gates() {
        let gate = |name: &str| format!(
            r#"<gate name="{}" instances="1">
                <transition name="alpha" expr_form="generic" expr="1 / 0"/>
                <transition name="beta" expr_form="generic" expr="1"/>
            </gate>"#,
            name
        );

        let document = format!(
            r#"<channelml units="SI Units">
                <channel_type name="Crowded">
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="1" default_erev="0">
                        {}{}{}{}
                    </current_voltage_relation>
                </channel_type>
            </channelml>"#,
            gate("a"), gate("b"), gate("c"), gate("d"),
        );

        let error = compile_str(&document, &CompilerSettings::default())
            .expect_err("fourth gate should be rejected");

        // rejected before any table would hit the division by zero
        assert!(error.is_configuration_error());
        assert_eq!(
            error.root_cause(),
            &ChannelTablesError::ConfigurationRelatedError(ConfigurationError::TooManyGates(4))
        );
        assert_eq!(error.locations(), vec!["channel 'Crowded'"]);
    }

    #[test]
    pub fn test_errors_are_located() {
        let document = r#"
            <channelml units="SI Units">
                <channel_type name="Broken">
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="1" default_erev="0">
                        <gate name="m" instances="1">
                            <transition name="alpha" expr_form="generic" expr="log(v)"/>
                            <transition name="beta" expr_form="generic" expr="1"/>
                        </gate>
                    </current_voltage_relation>
                </channel_type>
            </channelml>
        "#;

        let error = compile_str(document, &CompilerSettings::default())
            .expect_err("log of a negative voltage should fail");

        assert!(error.is_evaluation_error());
        assert_eq!(
            error.root_cause(),
            &ChannelTablesError::EvaluationRelatedError(EvaluationError::MathDomain(String::from("log")))
        );
        assert_eq!(error.locations(), vec!["channel 'Broken'", "gate 'm'"]);
        assert!(error.to_string().starts_with("channel 'Broken': gate 'm': "));
    }

    #[test]
    pub fn test_invalid_grids() {
        let settings = CompilerSettings::default();

        let huge_table = r#"
            <channelml units="SI Units">
                <channel_type name="Huge">
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="1" default_erev="0">
                        <impl_prefs>
                            <table_settings min_v="-0.1" max_v="0.1" table_divisions="18446744073709551615"/>
                        </impl_prefs>
                    </current_voltage_relation>
                </channel_type>
            </channelml>
        "#;
        let error = compile_str(huge_table, &settings).expect_err("division count should be capped");
        assert!(matches!(
            error.root_cause(),
            ChannelTablesError::ConfigurationRelatedError(ConfigurationError::InvalidGrid(_))
        ));
        assert_eq!(error.locations(), vec!["channel 'Huge'"]);

        for (min_conc, max_conc) in [("0.001", "0.001"), ("0.01", "0")] {
            let document = format!(
                r#"<channelml units="SI Units">
                    <channel_type name="Flat">
                        <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="1" default_erev="0">
                            <conc_dependence name="Calcium" ion="ca" variable_name="ca" min_conc="{}" max_conc="{}"/>
                        </current_voltage_relation>
                    </channel_type>
                </channelml>"#,
                min_conc, max_conc,
            );

            let error = compile_str(&document, &settings)
                .expect_err("concentration grid must be ascending");
            assert!(matches!(
                error.root_cause(),
                ChannelTablesError::ConfigurationRelatedError(ConfigurationError::InvalidGrid(_))
            ));
        }
    }

    #[test]
    pub fn test_invalid_documents() {
        let settings = CompilerSettings::default();

        let error = compile_str(r#"<channelml units="cgs Units"/>"#, &settings)
            .expect_err("unknown units should be rejected");
        assert_eq!(
            error,
            ChannelTablesError::ConfigurationRelatedError(
                ConfigurationError::UnsupportedUnitSystem(String::from("cgs Units"))
            )
        );

        assert!(matches!(
            compile_str("<channelml units=", &settings),
            Err(ChannelTablesError::ConfigurationRelatedError(ConfigurationError::MalformedDocument(_)))
        ));

        assert!(matches!(
            compile_str("<channelml/>", &settings),
            Err(ChannelTablesError::ConfigurationRelatedError(ConfigurationError::MissingAttribute { .. }))
        ));

        let missing_gmax = r#"
            <channelml units="SI Units">
                <channel_type name="NoGmax">
                    <current_voltage_relation cond_law="ohmic" ion="k" default_erev="0"/>
                </channel_type>
            </channelml>
        "#;
        let error = compile_str(missing_gmax, &settings).expect_err("ohmic channel needs gmax");
        assert_eq!(
            error.root_cause(),
            &ChannelTablesError::ConfigurationRelatedError(ConfigurationError::MissingAttribute {
                element: String::from("current_voltage_relation"),
                attribute: String::from("default_gmax"),
            })
        );

        let bad_number = r#"
            <channelml units="SI Units">
                <channel_type name="BadNumber">
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="lots" default_erev="0"/>
                </channel_type>
            </channelml>
        "#;
        let error = compile_str(bad_number, &settings).expect_err("gmax must be a number");
        assert!(matches!(
            error.root_cause(),
            ChannelTablesError::ConfigurationRelatedError(ConfigurationError::InvalidNumber { .. })
        ));

        let bad_form = r#"
            <channelml units="SI Units">
                <channel_type name="BadForm">
                    <current_voltage_relation cond_law="ohmic" ion="k" default_gmax="1" default_erev="0">
                        <gate name="m" instances="1">
                            <transition name="alpha" expr_form="tabulated" rate="1" midpoint="0" scale="1"/>
                            <transition name="beta" expr_form="generic" expr="1"/>
                        </gate>
                    </current_voltage_relation>
                </channel_type>
            </channelml>
        "#;
        let error = compile_str(bad_form, &settings).expect_err("unknown expression forms should fail");
        assert_eq!(
            error.root_cause(),
            &ChannelTablesError::ConfigurationRelatedError(
                ConfigurationError::UnsupportedExpressionForm(String::from("tabulated"))
            )
        );
        assert_eq!(error.locations(), vec!["channel 'BadForm'", "gate 'm'", "transition 'alpha'"]);
    }
}
