use dashboard::{Duration, Time, TimeSeries};
use tracing::warn;

use std::collections::{BTreeMap, HashMap};

mod id;

pub use id::ApplicationId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstanceIdx(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdx(usize);

/// An immutable topology snapshot for one window.
///
/// Entities live in flat arenas and refer to each other by index: an
/// application lists its instances, an instance names its owner and the node
/// it runs on, and a node lists the instances scheduled on it. Containers are
/// owned by their instance.
#[derive(Debug)]
pub struct World {
    from: Time,
    to: Time,
    step: Duration,
    applications: Vec<Application>,
    instances: Vec<Instance>,
    nodes: Vec<Node>,
    applications_by_id: HashMap<ApplicationId, usize>,
    nodes_by_name: HashMap<String, NodeIdx>,
}

impl World {
    pub fn from(&self) -> Time {
        self.from
    }

    pub fn to(&self) -> Time {
        self.to
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn application(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications_by_id
            .get(id)
            .map(|idx| &self.applications[*idx])
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes_by_name.get(name).map(|idx| &self.nodes[idx.0])
    }

    pub fn instance(&self, idx: InstanceIdx) -> &Instance {
        &self.instances[idx.0]
    }

    pub fn instances_of<'a>(&'a self, app: &'a Application) -> impl Iterator<Item = &'a Instance> {
        app.instances.iter().map(|idx| self.instance(*idx))
    }

    pub fn instances_on<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Instance> {
        node.instances.iter().map(|idx| self.instance(*idx))
    }

    pub fn node_of(&self, instance: &Instance) -> Option<&Node> {
        instance.node.map(|idx| &self.nodes[idx.0])
    }
}

#[derive(Debug)]
pub struct Application {
    id: ApplicationId,
    instances: Vec<InstanceIdx>,
}

impl Application {
    pub fn id(&self) -> &ApplicationId {
        &self.id
    }
}

#[derive(Debug)]
pub struct Instance {
    name: String,
    owner: ApplicationId,
    node: Option<NodeIdx>,
    containers: Vec<Container>,
}

impl Instance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &ApplicationId {
        &self.owner
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }
}

#[derive(Clone, Debug, Default)]
pub struct Container {
    pub name: String,
    pub cpu_usage: TimeSeries,
    pub cpu_limit: TimeSeries,
    pub cpu_delay: TimeSeries,
    pub throttled_time: TimeSeries,
}

impl Container {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct Node {
    pub name: String,
    pub cpu_usage_percent: TimeSeries,
    pub cpu_usage_by_mode: BTreeMap<String, TimeSeries>,
    pub cpu_capacity: TimeSeries,
    instances: Vec<InstanceIdx>,
}

impl Node {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Assembles a [`World`]. Back-references are filled in as instances are
/// added, so the finished world needs no further mutation.
pub struct WorldBuilder {
    world: World,
}

impl WorldBuilder {
    pub fn new(from: Time, to: Time, step: Duration) -> Self {
        Self {
            world: World {
                from,
                to,
                step,
                applications: Vec::new(),
                instances: Vec::new(),
                nodes: Vec::new(),
                applications_by_id: HashMap::new(),
                nodes_by_name: HashMap::new(),
            },
        }
    }

    /// Adds a node. A node whose name is already known is ignored and the
    /// existing index is returned.
    pub fn add_node(&mut self, mut node: Node) -> NodeIdx {
        if let Some(idx) = self.world.nodes_by_name.get(&node.name) {
            warn!("duplicate node in snapshot: {}", node.name);
            return *idx;
        }

        let idx = NodeIdx(self.world.nodes.len());
        node.instances.clear();
        self.world.nodes_by_name.insert(node.name.clone(), idx);
        self.world.nodes.push(node);
        idx
    }

    pub fn add_application(&mut self, id: ApplicationId) -> &mut Self {
        self.application_idx(id);
        self
    }

    /// Adds an instance owned by `owner`, creating the application if
    /// needed. An instance naming a node that isn't in the snapshot is kept
    /// without a node.
    pub fn add_instance<T: Into<String>>(
        &mut self,
        owner: &ApplicationId,
        name: T,
        node: Option<&str>,
        containers: Vec<Container>,
    ) -> InstanceIdx {
        let name = name.into();
        let idx = InstanceIdx(self.world.instances.len());
        let app = self.application_idx(owner.clone());

        let node = node.and_then(|n| match self.world.nodes_by_name.get(n) {
            Some(node) => Some(*node),
            None => {
                warn!("instance {name} of {owner} references unknown node {n}");
                None
            }
        });

        if let Some(node) = node {
            self.world.nodes[node.0].instances.push(idx);
        }

        self.world.applications[app].instances.push(idx);
        self.world.instances.push(Instance {
            name,
            owner: owner.clone(),
            node,
            containers,
        });

        idx
    }

    pub fn build(self) -> World {
        self.world
    }

    fn application_idx(&mut self, id: ApplicationId) -> usize {
        if let Some(idx) = self.world.applications_by_id.get(&id) {
            return *idx;
        }

        let idx = self.world.applications.len();
        self.world.applications_by_id.insert(id.clone(), idx);
        self.world.applications.push(Application {
            id,
            instances: Vec::new(),
        });
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut builder = WorldBuilder::new(Time(0), Time(60), Duration::MINUTE);
        builder.add_node(Node::new("node-1"));
        builder.add_node(Node::new("node-2"));

        let web = ApplicationId::new("default", "Deployment", "web");
        let db = ApplicationId::new("default", "StatefulSet", "db");

        builder.add_instance(&web, "web-1", Some("node-1"), vec![Container::new("app")]);
        builder.add_instance(&web, "web-2", Some("node-1"), vec![Container::new("app")]);
        builder.add_instance(&db, "db-0", Some("node-2"), vec![]);
        builder.add_instance(&db, "db-1", Some("node-3"), vec![]);
        builder.add_application(ApplicationId::new("default", "CronJob", "idle"));

        builder.build()
    }

    #[test]
    fn lookups_follow_indices_both_ways() {
        let world = world();

        let web = world
            .application(&"default:Deployment:web".parse().unwrap())
            .unwrap();
        let names: Vec<&str> = world.instances_of(web).map(|i| i.name()).collect();
        assert_eq!(names, vec!["web-1", "web-2"]);

        let node = world.node("node-1").unwrap();
        let on_node: Vec<&str> = world.instances_on(node).map(|i| i.name()).collect();
        assert_eq!(on_node, vec!["web-1", "web-2"]);

        let first = world.instances_of(web).next().unwrap();
        assert_eq!(world.node_of(first).unwrap().name, "node-1");
        assert_eq!(first.owner(), web.id());
    }

    #[test]
    fn unknown_node_leaves_instance_unscheduled() {
        let world = world();

        let db = world
            .application(&ApplicationId::new("default", "StatefulSet", "db"))
            .unwrap();
        let unscheduled = world.instances_of(db).find(|i| i.name() == "db-1").unwrap();

        assert!(world.node_of(unscheduled).is_none());
        assert!(world.node("node-3").is_none());
    }

    #[test]
    fn applications_without_instances_exist() {
        let world = world();

        let idle = world
            .application(&ApplicationId::new("default", "CronJob", "idle"))
            .unwrap();
        assert_eq!(world.instances_of(idle).count(), 0);
        assert_eq!(world.applications().len(), 3);
        assert_eq!(world.nodes().len(), 2);
    }

    #[test]
    fn duplicate_nodes_are_ignored() {
        let mut builder = WorldBuilder::new(Time(0), Time(60), Duration::MINUTE);
        let first = builder.add_node(Node::new("node-1"));
        let second = builder.add_node(Node::new("node-1"));

        assert_eq!(first, second);
        assert_eq!(builder.build().nodes().len(), 1);
    }
}
