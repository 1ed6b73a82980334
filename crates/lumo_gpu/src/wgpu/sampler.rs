//! wgpu sampler resources

use super::convert;
use super::DeviceShared;
use crate::sampler::{SamplerDescriptor, SamplerState};
use std::any::Any;
use std::sync::Arc;

pub struct WgpuSamplerState {
    pub(crate) sampler: wgpu::Sampler,
}

impl WgpuSamplerState {
    pub(crate) fn new(shared: &Arc<DeviceShared>, descriptor: &SamplerDescriptor) -> Self {
        let sampler = shared
            .device
            .create_sampler(&convert::sampler_descriptor(descriptor));
        Self { sampler }
    }
}

impl SamplerState for WgpuSamplerState {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
