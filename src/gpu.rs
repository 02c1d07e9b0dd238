//! GPU squared Euclidean distance transforms (Deep Fried Edition)
//!
//! Data-parallel wgpu compute kernels: the first pass runs a bounded
//! nearest-foreground search along one axis, later passes refine along the
//! remaining axes inside a shrinking radius bound. No envelope state, one
//! logical thread per lattice point; divergence is tolerated because memory
//! bandwidth dominates.
//!
//! Input contract differs from the CPU path: the kernels threshold the raw
//! grid at 0.5 (`>= 0.5` is foreground), so callers hand in the mask itself
//! rather than an indicator encoding.
//!
//! # GPU Pipeline
//!
//! 1. Upload the grid to a storage buffer
//! 2. Dispatch the first-axis kernel
//! 3. Snapshot `dist` into `org` between kernels (`copy_buffer_to_buffer`)
//! 4. Dispatch the refinement kernel(s)
//! 5. Readback the `dist` buffer to the CPU
//!
//! Author: Moroya Sakamoto

use thiserror::Error;
use wgpu::util::DeviceExt;

/// Error type for GPU transforms
#[derive(Error, Debug)]
pub enum GpuError {
    /// Failed to create GPU adapter
    #[error("Failed to create GPU adapter")]
    NoAdapter,

    /// Failed to create GPU device
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(String),

    /// Buffer mapping error
    #[error("Buffer mapping error: {0}")]
    BufferMapping(String),
}

/// Uniform buffer for kernel dispatch parameters (16 bytes, 16-byte aligned)
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct EdtUniforms {
    /// Grid extents: `[rows, cols, 1, 0]` in 2D, `[s0, s1, s2, 0]` in 3D
    dims: [u32; 4],
}

/// 2D kernel set: bounded search along axis 1, refinement along axis 0.
const SHADER_2D: &str = r#"// ALICE-EDT 2D Kernels

struct EdtUniforms {
    dims: vec4<u32>,
}

@group(0) @binding(0) var<storage, read> field: array<f32>;
@group(0) @binding(1) var<storage, read_write> dist: array<f32>;
@group(0) @binding(2) var<storage, read> org: array<f32>;
@group(0) @binding(3) var<uniform> uniforms: EdtUniforms;

const BACKGROUND: f32 = 1e10;

// Bounded nearest-foreground search along the column axis: a symmetric
// sweep while both neighbours exist, then the surviving one-sided tail.
@compute @workgroup_size(8, 8, 1)
fn first_axis(@builtin(global_invocation_id) gid: vec3<u32>) {
    let rows = uniforms.dims.x;
    let cols = uniforms.dims.y;
    if (gid.x >= cols || gid.y >= rows) {
        return;
    }
    let col = gid.x;
    let idx = gid.y * cols + col;

    if (field[idx] >= 0.5) {
        dist[idx] = 0.0;
        return;
    }

    var best = BACKGROUND;
    var found = false;
    var ct = 1u;
    while (!found && ct <= col && col + ct < cols) {
        if (field[idx - ct] >= 0.5 || field[idx + ct] >= 0.5) {
            best = f32(ct * ct);
            found = true;
        }
        ct = ct + 1u;
    }
    while (!found && ct <= col) {
        if (field[idx - ct] >= 0.5) {
            best = f32(ct * ct);
            found = true;
        }
        ct = ct + 1u;
    }
    while (!found && col + ct < cols) {
        if (field[idx + ct] >= 0.5) {
            best = f32(ct * ct);
            found = true;
        }
        ct = ct + 1u;
    }
    dist[idx] = best;
}

// Refinement along the row axis: only offsets inside the current best
// radius can improve the minimum, so the search shrinks as it goes.
@compute @workgroup_size(8, 8, 1)
fn second_axis(@builtin(global_invocation_id) gid: vec3<u32>) {
    let rows = uniforms.dims.x;
    let cols = uniforms.dims.y;
    if (gid.x >= cols || gid.y >= rows) {
        return;
    }
    let row = gid.y;
    let idx = row * cols + gid.x;

    var best = org[idx];
    var radius = sqrt(best);

    var ct = 1u;
    while (f32(ct) < radius && ct <= row) {
        let cand = f32(ct * ct) + org[idx - ct * cols];
        if (cand < best) {
            best = cand;
            radius = sqrt(cand);
        }
        ct = ct + 1u;
    }
    ct = 1u;
    while (f32(ct) < radius && row + ct < rows) {
        let cand = f32(ct * ct) + org[idx + ct * cols];
        if (cand < best) {
            best = cand;
            radius = sqrt(cand);
        }
        ct = ct + 1u;
    }
    dist[idx] = best;
}
"#;

/// 3D kernel set: bounded search along axis 1, refinement along axes 0 and 2.
const SHADER_3D: &str = r#"// ALICE-EDT 3D Kernels

struct EdtUniforms {
    dims: vec4<u32>,
}

@group(0) @binding(0) var<storage, read> field: array<f32>;
@group(0) @binding(1) var<storage, read_write> dist: array<f32>;
@group(0) @binding(2) var<storage, read> org: array<f32>;
@group(0) @binding(3) var<uniform> uniforms: EdtUniforms;

const BACKGROUND: f32 = 1e10;

// gid maps (x, y, z) -> (axis 2, axis 1, axis 0) of the row-major grid.

@compute @workgroup_size(4, 4, 4)
fn first_axis(@builtin(global_invocation_id) gid: vec3<u32>) {
    let s0 = uniforms.dims.x;
    let s1 = uniforms.dims.y;
    let s2 = uniforms.dims.z;
    if (gid.x >= s2 || gid.y >= s1 || gid.z >= s0) {
        return;
    }
    let j = gid.y;
    let stride = s2;
    let idx = (gid.z * s1 + j) * s2 + gid.x;

    if (field[idx] >= 0.5) {
        dist[idx] = 0.0;
        return;
    }

    var best = BACKGROUND;
    var found = false;
    var ct = 1u;
    while (!found && ct <= j && j + ct < s1) {
        if (field[idx - ct * stride] >= 0.5 || field[idx + ct * stride] >= 0.5) {
            best = f32(ct * ct);
            found = true;
        }
        ct = ct + 1u;
    }
    while (!found && ct <= j) {
        if (field[idx - ct * stride] >= 0.5) {
            best = f32(ct * ct);
            found = true;
        }
        ct = ct + 1u;
    }
    while (!found && j + ct < s1) {
        if (field[idx + ct * stride] >= 0.5) {
            best = f32(ct * ct);
            found = true;
        }
        ct = ct + 1u;
    }
    dist[idx] = best;
}

@compute @workgroup_size(4, 4, 4)
fn second_axis(@builtin(global_invocation_id) gid: vec3<u32>) {
    let s0 = uniforms.dims.x;
    let s1 = uniforms.dims.y;
    let s2 = uniforms.dims.z;
    if (gid.x >= s2 || gid.y >= s1 || gid.z >= s0) {
        return;
    }
    let i = gid.z;
    let stride = s1 * s2;
    let idx = (i * s1 + gid.y) * s2 + gid.x;

    var best = org[idx];
    var radius = sqrt(best);

    var ct = 1u;
    while (f32(ct) < radius && ct <= i) {
        let cand = f32(ct * ct) + org[idx - ct * stride];
        if (cand < best) {
            best = cand;
            radius = sqrt(cand);
        }
        ct = ct + 1u;
    }
    ct = 1u;
    while (f32(ct) < radius && i + ct < s0) {
        let cand = f32(ct * ct) + org[idx + ct * stride];
        if (cand < best) {
            best = cand;
            radius = sqrt(cand);
        }
        ct = ct + 1u;
    }
    dist[idx] = best;
}

@compute @workgroup_size(4, 4, 4)
fn third_axis(@builtin(global_invocation_id) gid: vec3<u32>) {
    let s0 = uniforms.dims.x;
    let s1 = uniforms.dims.y;
    let s2 = uniforms.dims.z;
    if (gid.x >= s2 || gid.y >= s1 || gid.z >= s0) {
        return;
    }
    let k = gid.x;
    let idx = (gid.z * s1 + gid.y) * s2 + k;

    var best = org[idx];
    var radius = sqrt(best);

    var ct = 1u;
    while (f32(ct) < radius && ct <= k) {
        let cand = f32(ct * ct) + org[idx - ct];
        if (cand < best) {
            best = cand;
            radius = sqrt(cand);
        }
        ct = ct + 1u;
    }
    ct = 1u;
    while (f32(ct) < radius && k + ct < s2) {
        let cand = f32(ct * ct) + org[idx + ct];
        if (cand < best) {
            best = cand;
            radius = sqrt(cand);
        }
        ct = ct + 1u;
    }
    dist[idx] = best;
}
"#;

/// GPU-based distance transformer
///
/// Compiles both kernel sets once and reuses the device across calls.
/// For one-shot work the [`gpu_edt_2d`] / [`gpu_edt_3d`] wrappers set
/// everything up per call.
pub struct GpuEdt {
    device: wgpu::Device,
    queue: wgpu::Queue,
    bind_group_layout: wgpu::BindGroupLayout,
    pipelines_2d: [wgpu::ComputePipeline; 2],
    pipelines_3d: [wgpu::ComputePipeline; 3],
}

impl GpuEdt {
    /// Create a transformer, acquiring a device and compiling the kernels.
    pub fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("ALICE-EDT Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("EDT Bind Group Layout"),
            entries: &[
                // Input grid (thresholded in-kernel)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Distance buffer (kernel output)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Snapshot of the previous kernel's output
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("EDT Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let module_2d = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ALICE-EDT 2D Kernels"),
            source: wgpu::ShaderSource::Wgsl(SHADER_2D.into()),
        });
        let module_3d = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ALICE-EDT 3D Kernels"),
            source: wgpu::ShaderSource::Wgsl(SHADER_3D.into()),
        });

        let make = |module: &wgpu::ShaderModule, entry: &str, label: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module,
                entry_point: Some(entry),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        };

        let pipelines_2d = [
            make(&module_2d, "first_axis", "EDT 2D First Axis"),
            make(&module_2d, "second_axis", "EDT 2D Second Axis"),
        ];
        let pipelines_3d = [
            make(&module_3d, "first_axis", "EDT 3D First Axis"),
            make(&module_3d, "second_axis", "EDT 3D Second Axis"),
            make(&module_3d, "third_axis", "EDT 3D Third Axis"),
        ];

        Ok(GpuEdt {
            device,
            queue,
            bind_group_layout,
            pipelines_2d,
            pipelines_3d,
        })
    }

    /// 2D transform of a row-major `[rows, cols]` grid.
    ///
    /// `f` is thresholded at 0.5 in-kernel: foreground `>= 0.5`, background
    /// below. Points with no foreground anywhere on the grid receive the
    /// 1e10 sentinel.
    ///
    /// # Panics
    /// If `f.len()` does not match `shape`.
    pub fn transform_2d(&self, f: &[f32], shape: [usize; 2]) -> Result<Vec<f32>, GpuError> {
        let [s0, s1] = shape;
        assert_eq!(f.len(), s0 * s1, "input length {} does not match shape", f.len());
        if f.is_empty() {
            return Ok(Vec::new());
        }
        let wg = 8u32;
        let dims = [s0 as u32, s1 as u32, 1, 0];
        let groups = [(s1 as u32 + wg - 1) / wg, (s0 as u32 + wg - 1) / wg, 1];
        self.run(f, dims, groups, &self.pipelines_2d)
    }

    /// 3D transform of a row-major `[planes, rows, cols]` grid.
    ///
    /// Same input contract as [`GpuEdt::transform_2d`].
    ///
    /// # Panics
    /// If `f.len()` does not match `shape`.
    pub fn transform_3d(&self, f: &[f32], shape: [usize; 3]) -> Result<Vec<f32>, GpuError> {
        let [s0, s1, s2] = shape;
        assert_eq!(f.len(), s0 * s1 * s2, "input length {} does not match shape", f.len());
        if f.is_empty() {
            return Ok(Vec::new());
        }
        let wg = 4u32;
        let dims = [s0 as u32, s1 as u32, s2 as u32, 0];
        let groups = [
            (s2 as u32 + wg - 1) / wg,
            (s1 as u32 + wg - 1) / wg,
            (s0 as u32 + wg - 1) / wg,
        ];
        self.run(f, dims, groups, &self.pipelines_3d)
    }

    /// Encode the kernel chain (with snapshot copies between kernels) and
    /// read the distance buffer back.
    fn run(
        &self,
        f: &[f32],
        dims: [u32; 4],
        groups: [u32; 3],
        passes: &[wgpu::ComputePipeline],
    ) -> Result<Vec<f32>, GpuError> {
        let size_bytes = std::mem::size_of_val(f) as u64;

        let field_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("EDT Field Buffer"),
                contents: bytemuck::cast_slice(f),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let dist_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("EDT Distance Buffer"),
            size: size_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let org_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("EDT Snapshot Buffer"),
            size: size_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("EDT Staging Buffer"),
            size: size_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = EdtUniforms { dims };
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("EDT Uniforms Buffer"),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("EDT Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: field_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: dist_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: org_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("EDT Encoder"),
            });

        for (i, pipeline) in passes.iter().enumerate() {
            if i > 0 {
                // Each kernel's read set is the previous kernel's write set;
                // the snapshot copy also serializes the two dispatches.
                encoder.copy_buffer_to_buffer(&dist_buffer, 0, &org_buffer, 0, size_bytes);
            }
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("EDT Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups[0], groups[1], groups[2]);
        }

        encoder.copy_buffer_to_buffer(&dist_buffer, 0, &staging_buffer, 0, size_bytes);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Readback
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = futures_channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        pollster::block_on(receiver)
            .map_err(|e| GpuError::BufferMapping(format!("Channel error: {}", e)))?
            .map_err(|e| GpuError::BufferMapping(format!("Map error: {:?}", e)))?;

        let mapped = buffer_slice.get_mapped_range();
        let data: Vec<f32> = bytemuck::cast_slice(&mapped).to_vec();
        drop(mapped);
        staging_buffer.unmap();

        Ok(data)
    }
}

/// One-shot 2D transform: acquire a device, dispatch, read back.
pub fn gpu_edt_2d(f: &[f32], shape: [usize; 2]) -> Result<Vec<f32>, GpuError> {
    GpuEdt::new()?.transform_2d(f, shape)
}

/// One-shot 3D transform: acquire a device, dispatch, read back.
pub fn gpu_edt_3d(f: &[f32], shape: [usize; 3]) -> Result<Vec<f32>, GpuError> {
    GpuEdt::new()?.transform_3d(f, shape)
}
