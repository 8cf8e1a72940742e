use ini::Ini;
use lazy_static::lazy_static;
use std::convert::Into;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, EnumIter, EnumString, Eq, IntoStaticStr, PartialEq)]
pub enum SessionSize {
    #[default]
    #[strum(serialize = "2")]
    Two = 0,
    #[strum(serialize = "3")]
    Three = 1,
    #[strum(serialize = "4")]
    Four = 2,
}

impl SessionSize {
    pub fn consoles(self) -> usize {
        self as usize + 2
    }
}

impl From<u8> for SessionSize {
    fn from(value: u8) -> Self {
        debug_assert!(value <= SessionSize::Four as u8);
        unsafe { std::mem::transmute(value) }
    }
}

impl From<SessionSize> for u8 {
    fn from(value: SessionSize) -> Self {
        value as u8
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, EnumIter, EnumString, Eq, IntoStaticStr, PartialEq)]
pub enum BeaconInterval {
    #[strum(serialize = "50")]
    Tu50 = 0,
    #[default]
    #[strum(serialize = "100")]
    Tu100 = 1,
    #[strum(serialize = "200")]
    Tu200 = 2,
}

impl BeaconInterval {
    pub fn tu(self) -> u16 {
        match self {
            BeaconInterval::Tu50 => 50,
            BeaconInterval::Tu100 => 100,
            BeaconInterval::Tu200 => 200,
        }
    }
}

impl From<u8> for BeaconInterval {
    fn from(value: u8) -> Self {
        debug_assert!(value <= BeaconInterval::Tu200 as u8);
        unsafe { std::mem::transmute(value) }
    }
}

impl From<BeaconInterval> for u8 {
    fn from(value: BeaconInterval) -> Self {
        value as u8
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    List(usize, Vec<&'static str>),
}

impl<D: Default + Into<u8> + Sized + Into<&'static str>, T: Iterator<Item = D>> From<T> for SettingValue {
    fn from(value: T) -> Self {
        SettingValue::List(Into::<u8>::into(D::default()) as usize, value.map(|d| d.into()).collect())
    }
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool_mut(&mut self) -> Option<&mut bool> {
        match self {
            SettingValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<(usize, &Vec<&'static str>)> {
        match self {
            SettingValue::List(selection, values) => Some((*selection, values)),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<(&mut usize, &mut Vec<&'static str>)> {
        match self {
            SettingValue::List(selection, values) => Some((selection, values)),
            _ => None,
        }
    }

    fn parse_str(&mut self, str: &str) {
        match self {
            SettingValue::Bool(value) => {
                if let Ok(parsed) = bool::from_str(str) {
                    *value = parsed;
                }
            }
            SettingValue::List(selection, values) => {
                if let Some(index) = values.iter().position(|value| *value == str) {
                    *selection = index;
                }
            }
        }
    }

    fn to_parse_string(&self) -> String {
        match self {
            SettingValue::Bool(value) => value.to_string(),
            SettingValue::List(selection, values) => values[*selection].to_string(),
        }
    }
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SettingValue::Bool(value) => {
                    if *value {
                        "on"
                    } else {
                        "off"
                    }
                }
                SettingValue::List(selection, values) => &values[*selection],
            }
        )
    }
}

#[derive(Clone)]
pub struct Setting {
    pub title: &'static str,
    pub description: &'static str,
    pub value: SettingValue,
}

impl Setting {
    const fn new(title: &'static str, description: &'static str, value: SettingValue) -> Self {
        Setting { title, description, value }
    }
}

lazy_static! {
    pub static ref DEFAULT_SETTINGS: Settings = Settings([
        Setting::new(
            "Local Wireless",
            "Lets consoles running in the same process see each other over wifi",
            SettingValue::Bool(true),
        ),
        Setting::new("Session Size", "Number of consoles taking part in a local session", SessionSize::iter().into()),
        Setting::new("Beacon Interval", "Beacon interval in time units the consoles advertise with", BeaconInterval::iter().into()),
    ]);
}

#[derive(Clone)]
pub struct Settings([Setting; 3]);

impl Settings {
    pub fn local_wireless(&self) -> bool {
        unsafe { self.0[0].value.as_bool().unwrap_unchecked() }
    }

    pub fn session_size(&self) -> SessionSize {
        unsafe { SessionSize::from(self.0[1].value.as_list().unwrap_unchecked().0 as u8) }
    }

    pub fn beacon_interval(&self) -> BeaconInterval {
        unsafe { BeaconInterval::from(self.0[2].value.as_list().unwrap_unchecked().0 as u8) }
    }

    pub fn set_local_wireless(&mut self, value: bool) {
        *self.0[0].value.as_bool_mut().unwrap() = value;
    }

    pub fn set_session_size(&mut self, value: SessionSize) {
        *self.0[1].value.as_list_mut().unwrap().0 = value as usize;
    }

    pub fn set_beacon_interval(&mut self, value: BeaconInterval) {
        *self.0[2].value.as_list_mut().unwrap().0 = value as usize;
    }

    pub fn get_all(&self) -> &[Setting; 3] {
        &self.0
    }

    pub fn get_all_mut(&mut self) -> &mut [Setting; 3] {
        &mut self.0
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_map();
        for setting in &self.0 {
            list.key(&setting.title).value(&setting.value.to_string());
        }
        list.finish()
    }
}

pub struct SettingsConfig {
    pub settings: Settings,
    pub settings_file_path: PathBuf,
    pub dirty: bool,
}

impl SettingsConfig {
    pub fn new(path: PathBuf) -> Self {
        let mut settings = DEFAULT_SETTINGS.clone();

        if let Ok(ini) = Ini::load_from_file(&path) {
            if let Some(section) = ini.section(None::<String>) {
                for setting in settings.get_all_mut() {
                    if let Some(value) = section.get(setting.title) {
                        setting.value.parse_str(value);
                    }
                }
            }
        }

        SettingsConfig {
            settings,
            settings_file_path: path,
            dirty: false,
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.dirty {
            let mut ini = Ini::new();
            let mut section = ini.with_section(None::<String>);
            for setting in self.settings.get_all_mut() {
                section.set(setting.title, setting.value.to_parse_string());
            }
            ini.write_to_file(&self.settings_file_path)?;
            self.dirty = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn defaults() {
        let settings = DEFAULT_SETTINGS.clone();
        assert!(settings.local_wireless());
        assert_eq!(settings.session_size(), SessionSize::Two);
        assert_eq!(settings.beacon_interval(), BeaconInterval::Tu100);
        assert_eq!(settings.beacon_interval().tu(), 100);
        assert_eq!(format!("{settings:?}"), r#"{"Local Wireless": "on", "Session Size": "2", "Beacon Interval": "100"}"#);
    }

    #[test]
    fn list_values_follow_enum_order() {
        let mut value: SettingValue = BeaconInterval::iter().into();
        assert_eq!(value, SettingValue::List(1, vec!["50", "100", "200"]));
        value.parse_str("200");
        assert_eq!(value.as_list().map(|(selection, _)| selection), Some(BeaconInterval::Tu200 as usize));
        assert_eq!(value.to_string(), "200");
    }

    #[test]
    fn every_setting_is_described() {
        let settings = DEFAULT_SETTINGS.clone();
        let titles: Vec<_> = settings.get_all().iter().map(|setting| setting.title).collect();
        assert_eq!(titles, vec!["Local Wireless", "Session Size", "Beacon Interval"]);
        assert!(settings.get_all().iter().all(|setting| !setting.description.is_empty()));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("dswifi_missing_{}.ini", std::process::id()));
        let config = SettingsConfig::new(path);
        assert!(config.settings.local_wireless());
        assert_eq!(config.settings.session_size(), SessionSize::Two);
    }

    #[test]
    fn settings_survive_a_flush() {
        let path = std::env::temp_dir().join(format!("dswifi_settings_{}.ini", std::process::id()));

        let mut config = SettingsConfig::new(path.clone());
        config.settings.set_local_wireless(false);
        config.settings.set_session_size(SessionSize::Four);
        config.settings.set_beacon_interval(BeaconInterval::Tu50);
        config.dirty = true;
        config.flush().unwrap();
        assert!(!config.dirty);

        let loaded = SettingsConfig::new(path.clone());
        assert!(!loaded.settings.local_wireless());
        assert_eq!(loaded.settings.session_size().consoles(), 4);
        assert_eq!(loaded.settings.beacon_interval(), BeaconInterval::Tu50);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn garbage_values_are_ignored() {
        let path = std::env::temp_dir().join(format!("dswifi_garbage_{}.ini", std::process::id()));
        fs::write(&path, "Local Wireless=maybe\nSession Size=9\nBeacon Interval=200\n").unwrap();

        let config = SettingsConfig::new(path.clone());
        assert!(config.settings.local_wireless());
        assert_eq!(config.settings.session_size(), SessionSize::Two);
        assert_eq!(config.settings.beacon_interval(), BeaconInterval::Tu200);

        fs::remove_file(path).unwrap();
    }
}
