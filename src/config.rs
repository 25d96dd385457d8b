//! Run configuration.
//!
//! [`Settings`] is a plain value handed to
//! [`smooth_normals_with_settings`](crate::smooth_normals_with_settings) and
//! never changes during a run.

use alloc::{borrow::Cow, string::String};
use core::str::FromStr;

/// Name of the auxiliary channel written by [`WriteChannel::Uv2`] unless
/// overridden.
pub const DEFAULT_UV_CHANNEL: &str = "UV2";

/// Where the smoothed normals end up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum WriteChannel {
    /// Octahedral encode each tangent-space normal and store it in an auxiliary
    /// UV channel.
    #[default]
    Uv2,
    /// Overwrite each loop's tangent with its tangent-space normal, unencoded.
    Tangent,
}

/// Error returned when parsing a [`WriteChannel`] from an unknown value.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("unknown write channel `{0}`, expected `uv2` or `tangent`")]
pub struct ParseWriteChannelError(String);

impl FromStr for WriteChannel {
    type Err = ParseWriteChannelError;

    /// Accepts the variant names as well as the enumerated values `"0"` and
    /// `"1"` used by host property panels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Self::Uv2),
            "1" => Ok(Self::Tangent),
            _ if s.eq_ignore_ascii_case("uv2") => Ok(Self::Uv2),
            _ if s.eq_ignore_ascii_case("tangent") => Ok(Self::Tangent),
            _ => Err(ParseWriteChannelError(s.into())),
        }
    }
}

/// How the members of a position group are blended.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Weighting {
    /// Every member contributes `1 / group_size`.
    #[default]
    Uniform,
    /// Members are weighted by the angle of their polygon corner.
    ///
    /// Falls back to [`Uniform`](Weighting::Uniform) for a group whose
    /// angles sum to zero.
    Angle,
}

/// Which normal forms the third row of the per-loop tangent basis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum NormalSource {
    /// The normal of the loop's vertex, shared by every loop on that vertex.
    #[default]
    Vertex,
    /// The loop's own (split) normal.
    Loop,
}

/// What a group receives when its blended normal sums to zero length.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ZeroNormalFallback {
    /// Keep the zero vector. It encodes to `[0, 0]`.
    #[default]
    Zero,
    /// Use the normalized normal of the group's first member.
    FirstMember,
}

/// Configuration for one pipeline run.
///
/// ```
/// # use smooth_normals::{Settings, WriteChannel, Weighting};
/// let settings = Settings::default()
///     .with_write_channel(WriteChannel::Tangent)
///     .with_weighting(Weighting::Angle);
/// assert_eq!(settings.uv_channel_name(), "UV2");
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Settings {
    write_channel: WriteChannel,
    weighting: Weighting,
    normal_source: NormalSource,
    zero_fallback: ZeroNormalFallback,
    uv_channel_name: Cow<'static, str>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            write_channel: WriteChannel::default(),
            weighting: Weighting::default(),
            normal_source: NormalSource::default(),
            zero_fallback: ZeroNormalFallback::default(),
            uv_channel_name: Cow::Borrowed(DEFAULT_UV_CHANNEL),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn with_write_channel(mut self, write_channel: WriteChannel) -> Self {
        self.write_channel = write_channel;
        self
    }

    #[must_use]
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    #[must_use]
    pub fn with_normal_source(mut self, normal_source: NormalSource) -> Self {
        self.normal_source = normal_source;
        self
    }

    #[must_use]
    pub fn with_zero_fallback(mut self, zero_fallback: ZeroNormalFallback) -> Self {
        self.zero_fallback = zero_fallback;
        self
    }

    /// Overrides the channel written in [`WriteChannel::Uv2`] mode.
    #[must_use]
    pub fn with_uv_channel_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.uv_channel_name = name.into();
        self
    }

    #[inline]
    pub const fn write_channel(&self) -> WriteChannel {
        self.write_channel
    }

    #[inline]
    pub const fn weighting(&self) -> Weighting {
        self.weighting
    }

    #[inline]
    pub const fn normal_source(&self) -> NormalSource {
        self.normal_source
    }

    #[inline]
    pub const fn zero_fallback(&self) -> ZeroNormalFallback {
        self.zero_fallback
    }

    #[inline]
    pub fn uv_channel_name(&self) -> &str {
        &self.uv_channel_name
    }
}
