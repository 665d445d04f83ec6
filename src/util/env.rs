//! Process configuration.
//!
//! Deserialization follows the approach of the [`envy`] crate: the environment is handed to serde
//! as a map of `(String, String)` pairs, scalar values are parsed on demand and comma-separated
//! values can be read as sequences.
//!
//! [`envy`]: https://github.com/softprops/envy

use std::iter::empty;
use std::sync::LazyLock;

use redact::Secret;
use serde::Deserialize;
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::constants;

static ENV: LazyLock<OnceCell<Env>> = LazyLock::new(OnceCell::new);
pub async fn env() -> EnvResult<&'static Env> {
    ENV.get_or_try_init(|| async { Env::new() }).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Env {
    pub twitch_client_id: Option<String>,
    pub twitch_client_secret: Option<Secret<String>>,
    pub database_url: String,
    #[serde(default = "default_port")]
    pub server_api_port: u16,
    #[serde(default = "default_helix_url")]
    pub helix_api_url: String,
    #[serde(default = "default_token_url")]
    pub twitch_token_url: String,
    #[serde(default = "default_token_cache")]
    pub twitch_token_cache: bool,
    #[serde(default)]
    pub cors_allow_origins: Vec<String>,
    #[serde(default)]
    pub log_format: LogFormat,
    pub otel_exporter_otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub api_service_name: String,
    #[serde(default = "default_tracer_name")]
    pub api_tracer_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Env {
    /// Loads `.env` (if present) on top of the process environment and deserializes the result.
    pub fn new() -> EnvResult<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            return Err(e.into());
        }

        Ok(from_iter(dotenvy::vars())?)
    }
}

#[inline]
const fn default_port() -> u16 {
    constants::SERVER_PORT
}

#[inline]
const fn default_token_cache() -> bool {
    true
}

fn default_helix_url() -> String {
    constants::API_HELIX_URL.to_string()
}

fn default_token_url() -> String {
    constants::API_TOKEN_URL.to_string()
}

fn default_service_name() -> String {
    constants::SERVICE_NAME.to_string()
}

fn default_tracer_name() -> String {
    constants::TRACER_NAME.to_string()
}

// ---
//  Deserializer implementation
// ---

/// A single variable's raw value, carrying its name so parse errors can point at the culprit
struct EnvValue {
    key: String,
    raw: String,
}

impl<'de> IntoDeserializer<'de, EnvDeserializeError> for EnvValue {
    type Deserializer = Self;
    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

macro_rules! forward_parsed_values {
    ($($ty:ident => $method:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, EnvDeserializeError>
            where
                V: de::Visitor<'de>
            {
                match self.raw.parse::<$ty>() {
                    Ok(val) => val.into_deserializer().$method(visitor),
                    Err(e) => Err(de::Error::custom(format_args!(
                        "{}: while parsing '{}' (variable: {})",
                        e, self.raw, self.key
                    ))),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for EnvValue {
    type Error = EnvDeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.raw.into_deserializer().deserialize_any(visitor)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        if self.raw.trim().is_empty() {
            return SeqDeserializer::new(empty::<EnvValue>()).deserialize_seq(visitor);
        }

        let key = self.key;
        let values = self.raw.split(',').map(|v| EnvValue {
            key: key.clone(),
            raw: v.trim().to_owned(),
        });

        SeqDeserializer::new(values).deserialize_seq(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _: &'static str,
        _: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self.raw.into_deserializer())
    }

    forward_parsed_values! {
        bool => deserialize_bool,
        u8 => deserialize_u8,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
    }

    serde::forward_to_deserialize_any! {
        i8 i16 f32 f64 char str string unit bytes byte_buf map
        unit_struct tuple_struct identifier tuple
        ignored_any struct
    }
}

pub fn from_iter<Iter, T>(iter: Iter) -> Result<T, EnvDeserializeError>
where
    T: DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    let vars = iter
        .into_iter()
        .map(|(key, raw)| (key.clone(), EnvValue { key, raw }));

    T::deserialize(MapDeserializer::new(vars))
}

impl de::Error for EnvDeserializeError {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        EnvDeserializeError::Custom(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        EnvDeserializeError::MissingValue(field.into())
    }
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error(transparent)]
    DeserializationError(#[from] EnvDeserializeError),
}

#[derive(Debug, Error)]
pub enum EnvDeserializeError {
    #[error("env deserialization error: {0}")]
    Custom(String),

    #[error("missing environment variable {0}")]
    MissingValue(String),
}
