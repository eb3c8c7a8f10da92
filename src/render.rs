//! Frame composition: shadow passes for every casting light, then the lit
//! pass over the whole stage.

use std::iter;

use crate::{context::Context, flow::Stage, lighting::SHADOW_UNIFORM_STRIDE};

pub fn render_frame(ctx: &Context, stage: &Stage) -> Result<(), wgpu::CurrentSurfaceTexture> {
    let output = match ctx.surface.get_current_texture() {
        wgpu::CurrentSurfaceTexture::Success(texture)
        | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
        other => return Err(other),
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder: wgpu::CommandEncoder =
        ctx.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

    // Refresh each casting light's depth layer before sampling it below.
    for (index, light) in ctx.lighting.lights().iter().enumerate() {
        if !light.casts_shadow {
            continue;
        }
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: ctx.lighting.layer_view(index),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });
        shadow_pass.set_pipeline(&ctx.pipelines.shadow);
        shadow_pass.set_bind_group(
            0,
            &ctx.lighting.shadow_bind_group,
            &[index as u32 * SHADOW_UNIFORM_STRIDE as u32],
        );
        stage.plane.draw_shadow(&mut shadow_pass);
        if let Some(model) = &stage.model {
            model.draw_shadow(&mut shadow_pass);
        }
    }

    {
        let mut render_pass: wgpu::RenderPass<'_> =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

        render_pass.set_pipeline(&ctx.pipelines.basic);
        stage.plane.draw(
            &ctx.camera.bind_group,
            &ctx.lighting.bind_group,
            &mut render_pass,
        );
        if let Some(model) = &stage.model {
            model.draw(
                &ctx.camera.bind_group,
                &ctx.lighting.bind_group,
                &mut render_pass,
            );
        }
    }

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}
