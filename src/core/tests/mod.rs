mod kanban_loop_tests;

use crate::core::clock::{EventHandler, SimulationClock};
use crate::core::error::SimulationError;
use crate::core::event::SimEvent;
use crate::core::scheduler_engine::SchedulerEngine;
use crate::core::topology::{ItemSpec, KanbanLoopSpec, OperationSpec, Topology, TopologyBuilder};

/// Drives a bare engine from the clock, without customers
pub(crate) struct EngineHandler {
    pub engine: SchedulerEngine,
}

impl EventHandler for EngineHandler {
    fn handle_event(
        &mut self,
        event: SimEvent,
        clock: &mut SimulationClock,
    ) -> Result<(), SimulationError> {
        if let SimEvent::OperationComplete { workshop, order } = event {
            self.engine.on_operation_complete(workshop, order, clock)?;
        }
        self.engine.tick(clock)?;
        Ok(())
    }
}

/// One workshop, one item, one loop: kanbans_nb=2, kanbans_qty=128, red_zone=1, batch=256
pub(crate) fn laser_topology() -> Topology {
    TopologyBuilder::new()
        .workshop("Laser")
        .item(ItemSpec::new("Bracket").operation(OperationSpec::new("cut", "Laser", 460.0, 8)))
        .kanban_loop(KanbanLoopSpec::new("bracket_loop", "Bracket", "Laser", 256, 2, 128, 1))
        .build()
        .unwrap()
}

/// Blank (pressed) is a mandatory component of Frame (welded); both loops start empty
pub(crate) fn press_weld_topology() -> Topology {
    TopologyBuilder::new()
        .workshop("Press")
        .workshop("Weld")
        .item(ItemSpec::new("Blank").operation(OperationSpec::new("press", "Press", 10.0, 1)))
        .item(
            ItemSpec::new("Frame")
                .operation(OperationSpec::new("weld", "Weld", 20.0, 1).consumes("Blank", 1)),
        )
        .kanban_loop(
            KanbanLoopSpec::new("blank_loop", "Blank", "Weld", 4, 2, 4, 1).with_initial_full_cards(0),
        )
        .kanban_loop(
            KanbanLoopSpec::new("frame_loop", "Frame", "Weld", 2, 2, 2, 1).with_initial_full_cards(0),
        )
        .build()
        .unwrap()
}
