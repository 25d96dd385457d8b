use core::{
    marker::PhantomData,
    ops::{Add, AddAssign, Mul, Sub},
};

/// Provides the math operations required by the smoothing pipeline but which
/// aren't included in Rust's [`core`] crate.
/// With the `std` feature enabled, a (default) implementation is provided.
pub trait Ops {
    /// Provides a [`sqrt`] implementation for [`f32`].
    ///
    /// [`sqrt`]: https://doc.rust-lang.org/stable/std/primitive.f32.html#method.sqrt
    // TODO: Provide default implementation if/when `core_float_math` is stable.
    //       See https://github.com/rust-lang/rust/issues/137578
    fn sqrt(x: f32) -> f32;

    /// Provides a [`acos`] implementation for [`f32`].
    /// Only called with values already clamped to `[-1, 1]`.
    ///
    /// [`acos`]: https://doc.rust-lang.org/stable/std/primitive.f32.html#method.acos
    fn acos(x: f32) -> f32;
}

pub(crate) struct Vec3<O: Ops> {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) z: f32,
    pub(crate) _phantom: PhantomData<O>,
}

impl<O: Ops> Copy for Vec3<O> {}

impl<O: Ops> Clone for Vec3<O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O: Ops> core::fmt::Debug for Vec3<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Vec3")
            .field(&self.x)
            .field(&self.y)
            .field(&self.z)
            .finish()
    }
}

impl<O: Ops> From<[f32; 3]> for Vec3<O> {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::ZERO
        }
    }
}

impl<O: Ops> From<Vec3<O>> for [f32; 3] {
    fn from(Vec3 { x, y, z, .. }: Vec3<O>) -> Self {
        [x, y, z]
    }
}

impl<O: Ops> Vec3<O> {
    pub(crate) const ZERO: Vec3<O> = Vec3 {
        x: 0.,
        y: 0.,
        z: 0.,
        _phantom: PhantomData,
    };

    pub(crate) fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub(crate) fn cross(self, rhs: Self) -> Self {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
            _phantom: PhantomData,
        }
    }

    pub(crate) fn is_zero(self) -> bool {
        !(not_zero(self.x) || not_zero(self.y) || not_zero(self.z))
    }

    /// Whether the vector can be normalized: every component is finite and
    /// at least one is larger than [`f32::MIN_POSITIVE`] in magnitude.
    pub(crate) fn has_direction(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && !self.is_zero()
    }

    /// Scales to unit length, or sets the vector to exactly zero when it has
    /// no direction.
    ///
    /// The vector is first divided by its largest component, so neither very
    /// small nor very large inputs under- or overflow the length.
    pub(crate) fn normalize_or_zero(&mut self) {
        if !self.has_direction() {
            *self = Self::ZERO;
            return;
        }

        let max = fabsf(self.x).max(fabsf(self.y)).max(fabsf(self.z));
        let scaled = *self * max.recip();
        *self = scaled * scaled.length().recip();
    }

    pub(crate) fn normalized_or_zero(mut self) -> Self {
        self.normalize_or_zero();
        self
    }

    pub(crate) fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub(crate) fn length(self) -> f32 {
        O::sqrt(self.length_squared())
    }

    /// Angle in radians between `self` and `rhs`.
    ///
    /// Returns a right angle when either vector has no direction, so a
    /// collapsed edge still contributes a finite weight.
    pub(crate) fn angle_between(self, rhs: Self) -> f32 {
        if !self.has_direction() || !rhs.has_direction() {
            return O::acos(0.);
        }

        let cos = self
            .normalized_or_zero()
            .dot(rhs.normalized_or_zero())
            .clamp(-1., 1.);
        O::acos(cos)
    }
}

impl<O: Ops> Add for Vec3<O> {
    type Output = Vec3<O>;

    fn add(self, rhs: Self) -> Self::Output {
        Vec3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
            _phantom: PhantomData,
        }
    }
}

impl<O: Ops> AddAssign for Vec3<O> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<O: Ops> Sub for Vec3<O> {
    type Output = Vec3<O>;

    fn sub(self, rhs: Self) -> Self::Output {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
            _phantom: PhantomData,
        }
    }
}

impl<O: Ops> Mul<f32> for Vec3<O> {
    type Output = Vec3<O>;

    fn mul(self, rhs: f32) -> Self::Output {
        Vec3 {
            x: rhs * self.x,
            y: rhs * self.y,
            z: rhs * self.z,
            _phantom: PhantomData,
        }
    }
}

impl<O: Ops> Mul<Vec3<O>> for f32 {
    type Output = Vec3<O>;

    fn mul(self, rhs: Vec3<O>) -> Self::Output {
        rhs * self
    }
}

impl<O: Ops> PartialEq for Vec3<O> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

pub(crate) fn fabsf(x: f32) -> f32 {
    if x.is_sign_negative() { -x } else { x }
}

pub(crate) fn not_zero(x: f32) -> bool {
    fabsf(x) > f32::MIN_POSITIVE
}
