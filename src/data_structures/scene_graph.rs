//! Scene graph and hierarchical scene organization.
//!
//! The stage owns a single tree of nodes: containers for pure transforms and
//! model nodes for drawable meshes. Each node holds a local and a derived
//! world transform; the world transform of a drawable node is written to a
//! one-element instance buffer read by the shaders.
//!
//! Ownership is strict: the root is held by the stage, children are owned by
//! their parent, and no node has more than one parent.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    model::{DrawModel, DrawShadow, Model},
};

pub trait SceneNode: Send {
    /// The index of the source node this one was decoded from, used to bind
    /// animation tracks back to the tree. Procedural nodes have none.
    fn source_index(&self) -> Option<usize>;

    fn local_transform(&self) -> &Instance;

    fn local_transform_mut(&mut self) -> &mut Instance;

    fn world_transform(&self) -> &Instance;

    fn children(&self) -> &[Box<dyn SceneNode>];

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    /// Recompute this node's world transform from `parent` and propagate to
    /// all children.
    fn update_world_transforms(&mut self, parent: &Instance);

    /// Find the node decoded from source node `index`, searching this node
    /// and its subtree.
    fn node_mut(&mut self, index: usize) -> Option<&mut dyn SceneNode>;

    /// Whether this node's meshes are rendered into the shadow maps.
    fn casts_shadow(&self) -> bool;

    /// Mark every drawable node in this subtree as a shadow caster.
    fn set_cast_shadows(&mut self, cast: bool);

    /// Upload dirty world transforms to the GPU.
    fn write_to_buffers(&mut self, queue: &wgpu::Queue);

    fn draw<'a, 'pass>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        lights_bind_group: &'a wgpu::BindGroup,
        render_pass: &mut wgpu::RenderPass<'pass>,
    ) where
        'a: 'pass;

    fn draw_shadow<'a, 'pass>(&'a self, render_pass: &mut wgpu::RenderPass<'pass>)
    where
        'a: 'pass;
}

/// A transform-only node grouping its children.
pub struct ContainerNode {
    source_index: Option<usize>,
    local: Instance,
    world: Instance,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl ContainerNode {
    pub fn new(source_index: Option<usize>, local: Instance) -> Self {
        Self {
            source_index,
            world: local.clone(),
            local,
            children: Vec::new(),
        }
    }
}

impl SceneNode for ContainerNode {
    fn source_index(&self) -> Option<usize> {
        self.source_index
    }

    fn local_transform(&self) -> &Instance {
        &self.local
    }

    fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.local
    }

    fn world_transform(&self) -> &Instance {
        &self.world
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world.clone();
        for child in &mut self.children {
            child.update_world_transforms(&world);
        }
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut dyn SceneNode> {
        if self.source_index == Some(index) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.node_mut(index))
    }

    fn casts_shadow(&self) -> bool {
        false
    }

    fn set_cast_shadows(&mut self, cast: bool) {
        for child in &mut self.children {
            child.set_cast_shadows(cast);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        for child in &mut self.children {
            child.write_to_buffers(queue);
        }
    }

    fn draw<'a, 'pass>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        lights_bind_group: &'a wgpu::BindGroup,
        render_pass: &mut wgpu::RenderPass<'pass>,
    ) where
        'a: 'pass,
    {
        for child in &self.children {
            child.draw(camera_bind_group, lights_bind_group, render_pass);
        }
    }

    fn draw_shadow<'a, 'pass>(&'a self, render_pass: &mut wgpu::RenderPass<'pass>)
    where
        'a: 'pass,
    {
        for child in &self.children {
            child.draw_shadow(render_pass);
        }
    }
}

/// A drawable node: a model plus the GPU copy of its world transform.
pub struct ModelNode {
    source_index: Option<usize>,
    local: Instance,
    world: Instance,
    children: Vec<Box<dyn SceneNode>>,
    model: Model,
    instance_buffer: wgpu::Buffer,
    casts_shadow: bool,
    receives_shadow: bool,
    dirty: bool,
}

impl ModelNode {
    pub fn new(
        source_index: Option<usize>,
        local: Instance,
        model: Model,
        receives_shadow: bool,
        device: &wgpu::Device,
    ) -> Self {
        let world = local.clone();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&[world.to_raw(receives_shadow)]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            source_index,
            local,
            world,
            children: Vec::new(),
            model,
            instance_buffer,
            casts_shadow: false,
            receives_shadow,
            dirty: false,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

impl SceneNode for ModelNode {
    fn source_index(&self) -> Option<usize> {
        self.source_index
    }

    fn local_transform(&self) -> &Instance {
        &self.local
    }

    fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.local
    }

    fn world_transform(&self) -> &Instance {
        &self.world
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        let world = parent * &self.local;
        if world != self.world {
            self.world = world;
            self.dirty = true;
        }
        let world = self.world.clone();
        for child in &mut self.children {
            child.update_world_transforms(&world);
        }
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut dyn SceneNode> {
        if self.source_index == Some(index) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.node_mut(index))
    }

    fn casts_shadow(&self) -> bool {
        self.casts_shadow
    }

    fn set_cast_shadows(&mut self, cast: bool) {
        self.casts_shadow = cast;
        for child in &mut self.children {
            child.set_cast_shadows(cast);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        if self.dirty {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&[self.world.to_raw(self.receives_shadow)]),
            );
            self.dirty = false;
        }
        for child in &mut self.children {
            child.write_to_buffers(queue);
        }
    }

    fn draw<'a, 'pass>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        lights_bind_group: &'a wgpu::BindGroup,
        render_pass: &mut wgpu::RenderPass<'pass>,
    ) where
        'a: 'pass,
    {
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.draw_model_instanced(&self.model, 0..1, camera_bind_group, lights_bind_group);
        for child in &self.children {
            child.draw(camera_bind_group, lights_bind_group, render_pass);
        }
    }

    fn draw_shadow<'a, 'pass>(&'a self, render_pass: &mut wgpu::RenderPass<'pass>)
    where
        'a: 'pass,
    {
        if self.casts_shadow {
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.draw_model_shadow(&self.model, 0..1);
        }
        for child in &self.children {
            child.draw_shadow(render_pass);
        }
    }
}
