/// Mirrors `DXGI_FORMAT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Format(pub i32);

impl Format {
    pub const UNKNOWN: Format = Format(0);
    pub const R32G32B32A32_FLOAT: Format = Format(2);
    pub const R32G32B32_FLOAT: Format = Format(6);
    pub const R16G16B16A16_FLOAT: Format = Format(10);
    pub const R32G32_FLOAT: Format = Format(16);
    pub const D32_FLOAT_S8X24_UINT: Format = Format(20);
    pub const R8G8B8A8_UNORM: Format = Format(28);
    pub const D32_FLOAT: Format = Format(40);
    pub const R32_FLOAT: Format = Format(41);
    pub const R32_UINT: Format = Format(42);
    pub const D24_UNORM_S8_UINT: Format = Format(45);
    pub const D16_UNORM: Format = Format(55);
    pub const R16_UNORM: Format = Format(56);
    pub const R16_UINT: Format = Format(57);

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            Format::D32_FLOAT_S8X24_UINT
                | Format::D32_FLOAT
                | Format::D24_UNORM_S8_UINT
                | Format::D16_UNORM
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(self, Format::D32_FLOAT_S8X24_UINT | Format::D24_UNORM_S8_UINT)
    }
}

/// Mirrors `D3D_FEATURE_LEVEL`. Ordered, so `level >= FeatureLevel::LEVEL_11_0` works.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FeatureLevel(pub i32);

impl FeatureLevel {
    pub const LEVEL_9_1: FeatureLevel = FeatureLevel(0x9100);
    pub const LEVEL_10_0: FeatureLevel = FeatureLevel(0xa000);
    pub const LEVEL_11_0: FeatureLevel = FeatureLevel(0xb000);
    pub const LEVEL_11_1: FeatureLevel = FeatureLevel(0xb100);
    pub const LEVEL_12_0: FeatureLevel = FeatureLevel(0xc000);
    pub const LEVEL_12_1: FeatureLevel = FeatureLevel(0xc100);
    pub const LEVEL_12_2: FeatureLevel = FeatureLevel(0xc200);

    pub fn major(self) -> u32 {
        ((self.0 >> 12) & 0xf) as u32
    }

    pub fn minor(self) -> u32 {
        ((self.0 >> 8) & 0xf) as u32
    }
}

impl std::fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_levels_order_and_print() {
        assert!(FeatureLevel::LEVEL_12_0 > FeatureLevel::LEVEL_11_1);
        assert!(FeatureLevel::LEVEL_10_0 < FeatureLevel::LEVEL_11_0);
        assert_eq!(FeatureLevel::LEVEL_11_0.to_string(), "11.0");
        assert_eq!(FeatureLevel::LEVEL_12_1.to_string(), "12.1");
    }

    #[test]
    fn depth_formats() {
        assert!(Format::D32_FLOAT.is_depth());
        assert!(!Format::D32_FLOAT.has_stencil());
        assert!(Format::D24_UNORM_S8_UINT.has_stencil());
        assert!(!Format::R8G8B8A8_UNORM.is_depth());
    }
}
