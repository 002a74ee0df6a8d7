/// wgpu render pipelines for real-time mosaic demosaicing
///
/// This module manages all the wgpu boilerplate:
/// - Device and queue initialization
/// - Mosaic and mask texture creation and uploads
/// - Uniform buffer for post-process parameters
/// - Render pipeline state for both demosaic paths
/// - Draw commands and CPU readback

use wgpu::util::DeviceExt;

use tracing::{debug, info};

use crate::error::ViewerError;
use crate::mosaic::MosaicFrame;
use crate::params::PostProcessParams;

/// Which fragment pipeline renders the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemosaicMode {
    /// Full plane reconstruction (extract / interpolate / blend / composite).
    Plane,
    /// Quick tile-mask decode with brightness/contrast/grayscale.
    Direct,
}

/// Post-process parameters in a GPU-friendly format.
/// Must match the WGSL `PostParams` struct layout (16-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuPostParams {
    brightness: f32,
    contrast: f32,
    grayscale: u32,
    _padding: u32,
}

impl From<&PostProcessParams> for GpuPostParams {
    fn from(params: &PostProcessParams) -> Self {
        Self {
            brightness: params.brightness,
            contrast: params.contrast,
            grayscale: params.grayscale as u32,
            _padding: 0,
        }
    }
}

/// Offscreen render target. Rgba8Unorm, usable as a color attachment, a
/// sampled texture for a host surface, and a readback source.
struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Demosaic Output Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// GPU demosaic pipelines over one shared device and mosaic texture.
pub struct BayerPipeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
    plane_pipeline: wgpu::RenderPipeline,
    direct_pipeline: wgpu::RenderPipeline,
    plane_layout: wgpu::BindGroupLayout,
    direct_layout: wgpu::BindGroupLayout,
    plane_bind_group: wgpu::BindGroup,
    direct_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    mosaic_texture: wgpu::Texture,
    mask_view: wgpu::TextureView,
    target: RenderTarget,
    width: u32,
    height: u32,
}

// Manual Debug implementation (wgpu types don't implement Debug)
impl std::fmt::Debug for BayerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BayerPipeline")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl BayerPipeline {
    /// Create the device, both render pipelines and all static resources
    /// for frames of the given (even) dimensions. Fails with a capability
    /// error when no suitable adapter or device exists.
    pub async fn new(width: u32, height: u32) -> Result<Self, ViewerError> {
        if width % 2 != 0 || height % 2 != 0 {
            return Err(ViewerError::OddDimensions(width, height));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ViewerError::NoAdapter)?;
        info!(adapter = %adapter.get_info().name, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Bayer Viewer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        // Mosaic input texture: one 8-bit sample per sensor position.
        // R8Uint is read with textureLoad, never through a sampler.
        let mosaic_texture = Self::create_mosaic_texture(&device, width, height);

        // 2x2 color-selection mask, repeated across the image by the
        // direct-decode shader's tile arithmetic.
        let mask_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tile Mask Texture"),
            size: wgpu::Extent3d {
                width: 2,
                height: 2,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &mask_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &super::shaders::MASK_TEXELS,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(8),
                rows_per_image: Some(2),
            },
            wgpu::Extent3d {
                width: 2,
                height: 2,
                depth_or_array_layers: 1,
            },
        );
        let mask_view = mask_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Params Uniform Buffer"),
            contents: bytemuck::cast_slice(&[GpuPostParams::from(&PostProcessParams::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Plane reconstruction binds only the mosaic texture.
        let plane_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Plane Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Uint,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        // Direct decode additionally binds the mask and the post params.
        let direct_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Direct Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Uint,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let plane_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Plane Reconstruction Shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::plane_shader().into()),
        });
        let direct_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Direct Decode Shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::direct_shader().into()),
        });

        let plane_pipeline =
            Self::create_pipeline(&device, &plane_layout, &plane_shader, "Plane Pipeline");
        let direct_pipeline =
            Self::create_pipeline(&device, &direct_layout, &direct_shader, "Direct Pipeline");

        let mosaic_view = mosaic_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let (plane_bind_group, direct_bind_group) = Self::create_bind_groups(
            &device,
            &plane_layout,
            &direct_layout,
            &mosaic_view,
            &mask_view,
            &uniform_buffer,
        );

        let target = RenderTarget::new(&device, width, height);

        Ok(Self {
            device,
            queue,
            plane_pipeline,
            direct_pipeline,
            plane_layout,
            direct_layout,
            plane_bind_group,
            direct_bind_group,
            uniform_buffer,
            mosaic_texture,
            mask_view,
            target,
            width,
            height,
        })
    }

    fn create_mosaic_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Mosaic Input Texture (R8Uint)"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Uint,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        shader: &wgpu::ShaderModule,
        label: &str,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // Disable culling for full-screen triangle
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
    }

    fn create_bind_groups(
        device: &wgpu::Device,
        plane_layout: &wgpu::BindGroupLayout,
        direct_layout: &wgpu::BindGroupLayout,
        mosaic_view: &wgpu::TextureView,
        mask_view: &wgpu::TextureView,
        uniform_buffer: &wgpu::Buffer,
    ) -> (wgpu::BindGroup, wgpu::BindGroup) {
        let plane = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Plane Bind Group"),
            layout: plane_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(mosaic_view),
            }],
        });
        let direct = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Direct Bind Group"),
            layout: direct_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(mosaic_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(mask_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });
        (plane, direct)
    }

    /// Recreate the mosaic texture, render target and bind groups for new
    /// frame dimensions. No-op when dimensions already match.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), ViewerError> {
        if width == self.width && height == self.height {
            return Ok(());
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(ViewerError::OddDimensions(width, height));
        }
        debug!(width, height, "resizing pipeline resources");

        self.mosaic_texture = Self::create_mosaic_texture(&self.device, width, height);
        let mosaic_view = self
            .mosaic_texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (plane, direct) = Self::create_bind_groups(
            &self.device,
            &self.plane_layout,
            &self.direct_layout,
            &mosaic_view,
            &self.mask_view,
            &self.uniform_buffer,
        );
        self.plane_bind_group = plane;
        self.direct_bind_group = direct;
        self.target = RenderTarget::new(&self.device, width, height);
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Upload a mosaic frame to the GPU, resizing resources if needed.
    pub fn upload_frame(&mut self, frame: &MosaicFrame) -> Result<(), ViewerError> {
        self.resize(frame.width(), frame.height())?;

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.mosaic_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.data(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Update the uniform buffer with new post-process parameters.
    pub fn update_params(&self, params: &PostProcessParams) {
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[GpuPostParams::from(params)]),
        );
    }

    /// Run the selected demosaic pipeline over the uploaded frame into the
    /// offscreen target.
    pub fn render(&self, mode: DemosaicMode) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Demosaic Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Demosaic Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            match mode {
                DemosaicMode::Plane => {
                    render_pass.set_pipeline(&self.plane_pipeline);
                    render_pass.set_bind_group(0, &self.plane_bind_group, &[]);
                }
                DemosaicMode::Direct => {
                    render_pass.set_pipeline(&self.direct_pipeline);
                    render_pass.set_bind_group(0, &self.direct_bind_group, &[]);
                }
            }
            render_pass.draw(0..3, 0..1); // Full-screen triangle
        }

        self.queue.submit(Some(encoder.finish()));
    }

    /// View of the rendered output, for presentation by a host surface.
    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.target.view
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Read the rendered output back to the CPU as tightly-packed RGBA
    /// bytes (row padding from the copy alignment is stripped).
    pub fn snapshot(&self) -> Vec<u8> {
        let bytes_per_row = self.width * 4;
        let padded_bytes_per_row = (bytes_per_row + 255) & !255;
        let buffer_size = (padded_bytes_per_row * self.height) as u64;

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snapshot Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Snapshot Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &output_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv().unwrap().unwrap();

        let data = buffer_slice.get_mapped_range();
        let mut output = Vec::with_capacity((self.width * self.height * 4) as usize);
        for y in 0..self.height {
            let start = (y * padded_bytes_per_row) as usize;
            let end = start + (self.width * 4) as usize;
            output.extend_from_slice(&data[start..end]);
        }

        drop(data);
        output_buffer.unmap();
        output
    }
}
