use std::fmt;

/// Element type of a raw buffer, as decoded from the source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    #[default]
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleType {
    /// Representable `(min, max)` of integer types, `None` for floats.
    pub fn integer_limits(self) -> Option<(f64, f64)> {
        match self {
            SampleType::U8 => Some((u8::MIN as f64, u8::MAX as f64)),
            SampleType::U16 => Some((u16::MIN as f64, u16::MAX as f64)),
            SampleType::I16 => Some((i16::MIN as f64, i16::MAX as f64)),
            SampleType::U32 => Some((u32::MIN as f64, u32::MAX as f64)),
            SampleType::I32 => Some((i32::MIN as f64, i32::MAX as f64)),
            SampleType::F32 | SampleType::F64 => None,
        }
    }

    pub fn is_integer(self) -> bool {
        self.integer_limits().is_some()
    }

    /// Round-trips `value` through this type: integers truncate toward zero
    /// and saturate, `F32` loses precision, `F64` is unchanged.
    #[inline]
    pub fn cast(self, value: f64) -> f64 {
        match self {
            SampleType::U8 => value as u8 as f64,
            SampleType::U16 => value as u16 as f64,
            SampleType::I16 => value as i16 as f64,
            SampleType::U32 => value as u32 as f64,
            SampleType::I32 => value as i32 as f64,
            SampleType::F32 => value as f32 as f64,
            SampleType::F64 => value,
        }
    }

    /// Like [`SampleType::cast`], but integer types round to nearest first.
    #[inline]
    pub fn quantize(self, value: f64) -> f64 {
        if self.is_integer() {
            self.cast(value.round())
        } else {
            self.cast(value)
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "u8",
            SampleType::U16 => "u16",
            SampleType::I16 => "i16",
            SampleType::U32 => "u32",
            SampleType::I32 => "i32",
            SampleType::F32 => "f32",
            SampleType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Element type of the normalized view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputType {
    /// Match the raw buffer's type.
    #[default]
    Same,
    Explicit(SampleType),
}

impl OutputType {
    pub fn resolve(self, raw: SampleType) -> SampleType {
        match self {
            OutputType::Same => raw,
            OutputType::Explicit(sample_type) => sample_type,
        }
    }
}

/// Sampling order used by the CPU resampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    #[default]
    Trilinear,
}

/// Axes of a `(pages, rows, cols)` volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneAxis {
    Depth,
    Vertical,
    Horizontal,
}

impl PlaneAxis {
    pub fn index(self) -> usize {
        match self {
            PlaneAxis::Depth => 0,
            PlaneAxis::Vertical => 1,
            PlaneAxis::Horizontal => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_truncates_and_saturates() {
        assert_eq!(SampleType::U8.cast(254.9), 254.0);
        assert_eq!(SampleType::U8.cast(300.0), 255.0);
        assert_eq!(SampleType::U8.cast(-3.0), 0.0);
        assert_eq!(SampleType::I16.cast(-40000.0), -32768.0);
        assert_eq!(SampleType::F64.cast(0.25), 0.25);
    }

    #[test]
    fn test_quantize_rounds_integers() {
        assert_eq!(SampleType::U16.quantize(0.5), 1.0);
        assert_eq!(SampleType::U16.quantize(2.49), 2.0);
        assert_eq!(SampleType::I16.quantize(-1.5), -2.0);
        assert_eq!(SampleType::U8.quantize(255.7), 255.0);
        assert_eq!(SampleType::F64.quantize(0.5), 0.5);
        assert_eq!(SampleType::F32.quantize(0.1), 0.1f32 as f64);
    }

    #[test]
    fn test_output_type_resolve() {
        assert_eq!(OutputType::Same.resolve(SampleType::I16), SampleType::I16);
        assert_eq!(
            OutputType::Explicit(SampleType::F32).resolve(SampleType::I16),
            SampleType::F32
        );
        assert!(SampleType::F32.integer_limits().is_none());
        assert_eq!(SampleType::U16.integer_limits(), Some((0.0, 65535.0)));
    }
}
