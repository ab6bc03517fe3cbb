use crate::model::{Application, Node, World};
use dashboard::Dashboard;

mod cpu;

type Generator = fn(&World, &Application) -> Dashboard;

// dashboards rendered for an application, in display order
static APPLICATION_DASHBOARDS: &[Generator] = &[cpu::application];

pub fn application(world: &World, app: &Application) -> Vec<Dashboard> {
    APPLICATION_DASHBOARDS
        .iter()
        .map(|generate| generate(world, app))
        .collect()
}

pub fn node(world: &World, node: &Node) -> Vec<Dashboard> {
    vec![cpu::node(world, node)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApplicationId, WorldBuilder};
    use dashboard::{Duration, Time};

    #[test]
    fn empty_application_has_empty_dashboards() {
        let id = ApplicationId::new("default", "Deployment", "web");
        let mut builder = WorldBuilder::new(Time(0), Time(60), Duration::MINUTE);
        builder.add_application(id.clone());
        let world = builder.build();

        let dashboards = application(&world, world.application(&id).unwrap());

        let names: Vec<&str> = dashboards.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["CPU"]);
        assert!(dashboards[0].chart_groups().is_empty());
    }
}
