use strum::EnumString;
use strum::EnumVariantNames;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ThemeName {
    Light,
    #[default]
    Dark,
}

impl ThemeName {
    /// Falls back to the dark palette rather than failing: the value has
    /// already been validated by the CLI layer by the time it is read back.
    pub fn parse(value: &str) -> ThemeName {
        return value.parse::<ThemeName>().unwrap_or_default();
    }
}
