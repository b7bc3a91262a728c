use tracing::debug;
use tracing::info;

use crate::backend::Adapter;
use crate::backend::AdapterInfo;
use crate::backend::Backend;
use crate::backend::Device;
use crate::backend::Instance;
use crate::config::GfxConfig;
use crate::constants::MIN_FEATURE_LEVEL;
use crate::desc::DescriptorHeapType;
use crate::desc::FeatureLevel;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;

/// The selected adapter and the logical device created on it.
pub struct DeviceContext<B: Backend> {
    device: B::Device,
    adapter_info: AdapterInfo,
    feature_level: FeatureLevel,
    increments: [u32; DescriptorHeapType::ALL.len()],
}

impl<B: Backend> DeviceContext<B> {
    pub fn new(instance: &B::Instance, config: &GfxConfig) -> GfxResult<Self> {
        let adapter = select_adapter::<B>(instance, config)?;
        let device = instance.create_device(&adapter.raw, MIN_FEATURE_LEVEL)?;

        let feature_level = device.feature_level();
        if feature_level < MIN_FEATURE_LEVEL {
            return Err(GfxError::new(
                GfxErrorKind::DeviceCreationFailed,
                format!(
                    "{} reports feature level {}, need at least {}",
                    adapter.info.name, feature_level, MIN_FEATURE_LEVEL
                ),
            ));
        }

        let increments = DescriptorHeapType::ALL.map(|heap_type| device.descriptor_increment(heap_type));
        info!(
            "Created {} device on {} (feature level {})",
            B::NAME,
            adapter.info.name,
            feature_level
        );

        Ok(Self {
            device,
            adapter_info: adapter.info,
            feature_level,
            increments,
        })
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn adapter_info(&self) -> &AdapterInfo {
        &self.adapter_info
    }

    pub fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    /// Byte distance between consecutive descriptors of `heap_type`.
    pub fn descriptor_increment(&self, heap_type: DescriptorHeapType) -> GfxResult<u32> {
        usize::try_from(heap_type.0)
            .ok()
            .and_then(|index| self.increments.get(index))
            .copied()
            .ok_or_else(|| {
                GfxError::new(
                    GfxErrorKind::ResourceCreationFailed,
                    format!("unknown descriptor heap type {}", heap_type.0),
                )
            })
    }

    pub fn removed_reason(&self) -> Option<String> {
        self.device.removed_reason()
    }
}

/// Picks the adapter to create the device on.
///
/// WARP is used only when the config asks for it. Otherwise the first
/// hardware adapter that supports [`MIN_FEATURE_LEVEL`] wins; software
/// adapters are never picked implicitly.
pub fn select_adapter<B: Backend>(instance: &B::Instance, config: &GfxConfig) -> GfxResult<Adapter<B>> {
    if config.use_warp_device {
        info!("Using WARP adapter.");
        return instance.warp_adapter();
    }

    for adapter in instance.adapters()? {
        let info = &adapter.info;
        if info.is_software {
            debug!("Adapter {}: {} (software, skipping)", info.index, info.name);
            continue;
        }
        if !instance.supports_feature_level(&adapter.raw, MIN_FEATURE_LEVEL) {
            debug!(
                "Adapter {}: {} (does not support feature level {})",
                info.index, info.name, MIN_FEATURE_LEVEL
            );
            continue;
        }
        debug!(
            "Adapter {}: {} ({} MiB dedicated, selected)",
            info.index,
            info.name,
            info.dedicated_video_memory / (1024 * 1024)
        );
        return Ok(adapter);
    }

    Err(GfxError::new(
        GfxErrorKind::AdapterNotFound,
        format!("no hardware adapter supports feature level {}", MIN_FEATURE_LEVEL),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::Headless;
    use crate::headless::HeadlessAdapter;
    use crate::headless::HeadlessInstance;

    #[test]
    fn skips_software_and_old_adapters() {
        let instance = HeadlessInstance::with_adapters(vec![
            HeadlessAdapter::software("Microsoft Basic Render Driver"),
            HeadlessAdapter::hardware("Old GPU", FeatureLevel::LEVEL_10_0),
            HeadlessAdapter::hardware("Terrain GPU", FeatureLevel::LEVEL_12_1),
        ]);
        let adapter = select_adapter::<Headless>(&instance, &GfxConfig::default()).unwrap();
        assert_eq!(adapter.info.name, "Terrain GPU");
        assert_eq!(adapter.info.index, 2);
    }

    #[test]
    fn never_falls_back_to_software() {
        let instance = HeadlessInstance::with_adapters(vec![HeadlessAdapter::software("WARP")]);
        let err = select_adapter::<Headless>(&instance, &GfxConfig::default()).unwrap_err();
        assert!(err.is(GfxErrorKind::AdapterNotFound));
    }

    #[test]
    fn warp_only_when_requested() {
        let instance = HeadlessInstance::with_adapters(vec![]);
        let config = GfxConfig {
            use_warp_device: true,
            ..Default::default()
        };
        let context = DeviceContext::<Headless>::new(&instance, &config).unwrap();
        assert!(context.adapter_info().is_software);
        assert!(context.feature_level() >= MIN_FEATURE_LEVEL);
    }

    #[test]
    fn caches_increments_per_heap_type() {
        let instance = HeadlessInstance::new();
        let context = DeviceContext::<Headless>::new(&instance, &GfxConfig::default()).unwrap();
        for heap_type in DescriptorHeapType::ALL {
            assert_eq!(
                context.descriptor_increment(heap_type).unwrap(),
                context.device().descriptor_increment(heap_type)
            );
        }
    }

    #[test]
    fn unknown_heap_type_has_no_increment() {
        let instance = HeadlessInstance::new();
        let context = DeviceContext::<Headless>::new(&instance, &GfxConfig::default()).unwrap();
        for heap_type in [DescriptorHeapType(4), DescriptorHeapType(-1)] {
            let err = context.descriptor_increment(heap_type).unwrap_err();
            assert!(err.is(GfxErrorKind::ResourceCreationFailed));
            assert!(err.message().contains("unknown descriptor heap type"), "{err}");
        }
    }
}
