mod tdm_configuration;

pub use tdm_configuration::TdmConfiguration;
