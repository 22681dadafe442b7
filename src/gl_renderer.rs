use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use canvas_gallery::constants::{
    BACKGROUND_COLOR, PLACEHOLDER_COLOR, SPINNER_COLOR, SPINNER_INNER_RADIUS, SPINNER_OPACITY,
    SPINNER_OUTER_RADIUS,
};
use canvas_gallery::renderer::{DrawItem, DrawKind, Frame, Renderer};
use canvas_gallery::resource::{ResourceHandle, ResourceId};
use glam::{Mat4, Vec3};
use glow::*;
use tracing::warn;

const VERTEX_SHADER_SRC: &str = r#"#version 330 core
layout (location = 0) in vec2 aPos;

uniform mat4 uViewProjection;
uniform mat4 uModel;

out vec2 vUv;

void main() {
    vUv = vec2(aPos.x + 0.5, 0.5 - aPos.y);
    gl_Position = uViewProjection * uModel * vec4(aPos, 0.0, 1.0);
}
"#;

const FRAGMENT_SHADER_SRC: &str = r#"#version 330 core
in vec2 vUv;
out vec4 FragColor;

uniform int uMode;
uniform sampler2D uTexture;
uniform vec3 uColor;
uniform float uOpacity;
uniform float uRingInner;

void main() {
    if (uMode == 0) {
        vec4 texel = texture(uTexture, vUv);
        FragColor = vec4(texel.rgb, texel.a * uOpacity);
    } else if (uMode == 1) {
        FragColor = vec4(uColor, uOpacity);
    } else {
        // Ring with a quarter cut out so rotation is visible
        vec2 d = vUv - 0.5;
        float r = length(d);
        if (r < uRingInner || r > 0.5 || (d.x > 0.0 && d.y > 0.0)) {
            discard;
        }
        FragColor = vec4(uColor, uOpacity);
    }
}
"#;

const MODE_TEXTURED: i32 = 0;
const MODE_FLAT: i32 = 1;
const MODE_RING: i32 = 2;

struct Uniforms {
    view_projection: NativeUniformLocation,
    model: NativeUniformLocation,
    mode: NativeUniformLocation,
    texture: NativeUniformLocation,
    color: NativeUniformLocation,
    opacity: NativeUniformLocation,
    ring_inner: NativeUniformLocation,
}

/// Draws gallery frames as textured quads. Textures are uploaded the first
/// time a resource is drawn and deleted when the gallery releases it.
pub struct GlRenderer {
    gl: Arc<glow::Context>,
    program: NativeProgram,
    vao: NativeVertexArray,
    vbo: NativeBuffer,
    uniforms: Uniforms,
    textures: HashMap<ResourceId, NativeTexture>,
}

impl GlRenderer {
    pub fn new(gl: Arc<glow::Context>) -> Result<Self, String> {
        unsafe {
            let vertex_shader = compile_shader(&gl, VERTEX_SHADER, VERTEX_SHADER_SRC)?;
            let fragment_shader = compile_shader(&gl, FRAGMENT_SHADER, FRAGMENT_SHADER_SRC)?;

            let program = gl
                .create_program()
                .map_err(|e| format!("Failed to create program: {}", e))?;
            gl.attach_shader(program, vertex_shader);
            gl.attach_shader(program, fragment_shader);
            gl.link_program(program);
            if !gl.get_program_link_status(program) {
                return Err(gl.get_program_info_log(program));
            }
            gl.delete_shader(vertex_shader);
            gl.delete_shader(fragment_shader);

            let location = |name: &str| {
                gl.get_uniform_location(program, name)
                    .ok_or_else(|| format!("Failed to get {} uniform location", name))
            };
            let uniforms = Uniforms {
                view_projection: location("uViewProjection")?,
                model: location("uModel")?,
                mode: location("uMode")?,
                texture: location("uTexture")?,
                color: location("uColor")?,
                opacity: location("uOpacity")?,
                ring_inner: location("uRingInner")?,
            };

            // Unit quad centered on the origin
            let vertices: [f32; 12] = [
                -0.5, -0.5, //
                0.5, -0.5, //
                0.5, 0.5, //
                -0.5, -0.5, //
                0.5, 0.5, //
                -0.5, 0.5,
            ];

            let vao = gl
                .create_vertex_array()
                .map_err(|e| format!("Failed to create VAO: {}", e))?;
            gl.bind_vertex_array(Some(vao));

            let vbo = gl
                .create_buffer()
                .map_err(|e| format!("Failed to create VBO: {}", e))?;
            gl.bind_buffer(ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(ARRAY_BUFFER, as_u8_slice(&vertices), STATIC_DRAW);
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, FLOAT, false, 8, 0);
            gl.bind_vertex_array(None);

            gl.enable(BLEND);
            gl.blend_func(SRC_ALPHA, ONE_MINUS_SRC_ALPHA);

            Ok(Self {
                gl,
                program,
                vao,
                vbo,
                uniforms,
                textures: HashMap::new(),
            })
        }
    }

    pub fn resize(&self, width: i32, height: i32) {
        unsafe {
            self.gl.viewport(0, 0, width, height);
        }
    }

    fn texture_for(&mut self, handle: &ResourceHandle) -> Result<NativeTexture, String> {
        if let Some(texture) = self.textures.get(&handle.id()) {
            return Ok(*texture);
        }

        let image = handle.image();
        let texture = unsafe {
            let gl = &self.gl;
            let tex = gl
                .create_texture()
                .map_err(|e| format!("Failed to create texture: {}", e))?;
            gl.bind_texture(TEXTURE_2D, Some(tex));
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MIN_FILTER, LINEAR as i32);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MAG_FILTER, LINEAR as i32);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_S, CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_T, CLAMP_TO_EDGE as i32);
            gl.pixel_store_i32(UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                TEXTURE_2D,
                0,
                RGBA as i32,
                image.width as i32,
                image.height as i32,
                0,
                RGBA,
                UNSIGNED_BYTE,
                Some(&image.pixels),
            );
            tex
        };
        self.textures.insert(handle.id(), texture);
        Ok(texture)
    }

    unsafe fn draw_flat(&self, model: &Mat4, color: [f32; 3], opacity: f32) {
        let gl = &self.gl;
        gl.uniform_1_i32(Some(&self.uniforms.mode), MODE_FLAT);
        gl.uniform_3_f32(Some(&self.uniforms.color), color[0], color[1], color[2]);
        gl.uniform_1_f32(Some(&self.uniforms.opacity), opacity);
        gl.uniform_matrix_4_f32_slice(Some(&self.uniforms.model), false, model.as_ref());
        gl.draw_arrays(TRIANGLES, 0, 6);
    }

    unsafe fn draw_spinner(&self, item: &DrawItem, angle: f32, opacity: f32) {
        let gl = &self.gl;
        let diameter = SPINNER_OUTER_RADIUS * 2.0;
        let model = Mat4::from_translation(item.position.extend(0.1))
            * Mat4::from_rotation_z(angle)
            * Mat4::from_scale(Vec3::new(diameter, diameter, 1.0));
        let inner = 0.5 * SPINNER_INNER_RADIUS / SPINNER_OUTER_RADIUS;

        gl.uniform_1_i32(Some(&self.uniforms.mode), MODE_RING);
        gl.uniform_1_f32(Some(&self.uniforms.ring_inner), inner);
        gl.uniform_3_f32(
            Some(&self.uniforms.color),
            SPINNER_COLOR[0],
            SPINNER_COLOR[1],
            SPINNER_COLOR[2],
        );
        gl.uniform_1_f32(Some(&self.uniforms.opacity), SPINNER_OPACITY * opacity);
        gl.uniform_matrix_4_f32_slice(Some(&self.uniforms.model), false, model.as_ref());
        gl.draw_arrays(TRIANGLES, 0, 6);
    }

    fn draw_item(&mut self, item: &DrawItem) {
        match &item.kind {
            DrawKind::Image | DrawKind::FadeOut => {
                let Some(handle) = &item.resource else {
                    return;
                };
                let texture = match self.texture_for(handle) {
                    Ok(texture) => texture,
                    Err(e) => {
                        warn!(tile = %item.tile, error = %e, "texture upload failed");
                        return;
                    }
                };
                unsafe {
                    let gl = &self.gl;
                    gl.active_texture(TEXTURE0);
                    gl.bind_texture(TEXTURE_2D, Some(texture));
                    gl.uniform_1_i32(Some(&self.uniforms.texture), 0);
                    gl.uniform_1_i32(Some(&self.uniforms.mode), MODE_TEXTURED);
                    gl.uniform_1_f32(Some(&self.uniforms.opacity), item.opacity);
                    gl.uniform_matrix_4_f32_slice(
                        Some(&self.uniforms.model),
                        false,
                        item.model.as_ref(),
                    );
                    gl.draw_arrays(TRIANGLES, 0, 6);
                }
            }
            DrawKind::Placeholder { spinner } => unsafe {
                self.draw_flat(&item.model, PLACEHOLDER_COLOR, item.opacity);
                if let Some(angle) = spinner {
                    self.draw_spinner(item, *angle, item.opacity);
                }
            },
        }
    }
}

impl Renderer for GlRenderer {
    fn render(&mut self, frame: &Frame) {
        puffin::profile_function!();

        unsafe {
            let gl = &self.gl;
            gl.clear_color(BACKGROUND_COLOR[0], BACKGROUND_COLOR[1], BACKGROUND_COLOR[2], 1.0);
            gl.clear(COLOR_BUFFER_BIT);
            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vao));
            gl.uniform_matrix_4_f32_slice(
                Some(&self.uniforms.view_projection),
                false,
                frame.view_projection.as_ref(),
            );
        }

        for item in &frame.items {
            self.draw_item(item);
        }

        unsafe {
            self.gl.bind_vertex_array(None);
        }
    }

    fn release(&mut self, resource: ResourceId) {
        if let Some(texture) = self.textures.remove(&resource) {
            unsafe {
                self.gl.delete_texture(texture);
            }
        }
    }
}

impl Drop for GlRenderer {
    fn drop(&mut self) {
        unsafe {
            for (_, texture) in self.textures.drain() {
                self.gl.delete_texture(texture);
            }
            self.gl.delete_program(self.program);
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
        }
    }
}

unsafe fn compile_shader(gl: &glow::Context, kind: u32, source: &str) -> Result<NativeShader, String> {
    let shader = gl
        .create_shader(kind)
        .map_err(|e| format!("Failed to create shader: {}", e))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        return Err(gl.get_shader_info_log(shader));
    }
    Ok(shader)
}

fn as_u8_slice<T>(data: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * mem::size_of::<T>()) }
}
