struct PuzzleScene {
    config: PuzzleConfig,
    session: Option<SessionOrchestrator>,
}

impl PuzzleScene {
    fn new(config: PuzzleConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

impl Scene for PuzzleScene {
    fn load(&mut self, world: &mut SceneWorld) {
        let units = match build_bolts(&self.config.layout, &self.config.canonical_units(), world) {
            Ok(units) => units,
            Err(error) => {
                error!(error = %error, "puzzle_layout_failed");
                return;
            }
        };
        world.set_plate(plate_for(&self.config.layout, units.len()));

        match SessionOrchestrator::new(&self.config, units) {
            Ok(mut session) => {
                session.begin(world);
                self.session = Some(session);
            }
            Err(error) => error!(error = %error, "puzzle_setup_failed"),
        }
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        let Some(session) = self.session.as_mut() else {
            return SceneCommand::None;
        };

        if input.action_pressed(InputAction::Restart) {
            session.restart(world);
        }
        if input.action_pressed(InputAction::TogglePause) {
            session.toggle_pause();
        }
        let aim = aim_from_input(input, world);
        session.tick(fixed_dt_seconds, input.pointer(), &aim, world);
        SceneCommand::None
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        self.session = None;
        info!("puzzle_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        self.session.as_ref().map(SessionOrchestrator::hud_text)
    }
}

fn aim_from_input(input: &InputSnapshot, world: &SceneWorld) -> PickedUnit {
    PickedUnit(
        input
            .cursor_position_px()
            .and_then(|cursor| world.pick_unit_at_cursor(cursor, input.window_size())),
    )
}

/// One root per bolt, with shaft and cap children. Bolts are laid out left
/// to right by ascending id, centred on x = 0.
fn build_bolts(
    layout: &LayoutConfig,
    ids: &[UnitId],
    world: &mut SceneWorld,
) -> Result<Vec<AssemblyUnit>, NodeError> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    let center = (sorted.len() as f32 - 1.0) / 2.0;

    let mut units = Vec::with_capacity(sorted.len());
    for (index, id) in sorted.into_iter().enumerate() {
        let x = (index as f32 - center) * layout.bolt_spacing;
        let nodes = world.nodes_mut();
        let root = nodes.insert(
            format!("bolt_{id}"),
            None,
            NodePose {
                position: Vec3::new(x, 0.0, 0.0),
                euler_degrees: Vec3::ZERO,
            },
        )?;
        let shaft = nodes.insert(
            format!("bolt_{id}/shaft"),
            Some(root),
            NodePose {
                position: Vec3::new(0.0, layout.shaft_height, 0.0),
                euler_degrees: Vec3::ZERO,
            },
        )?;
        let cap = nodes.insert(
            format!("bolt_{id}/cap"),
            Some(root),
            NodePose {
                position: Vec3::new(0.0, layout.cap_height, 0.0),
                euler_degrees: Vec3::ZERO,
            },
        )?;

        let unit = AssemblyUnit::new(id, cap, shaft);
        world.visuals_mut().push(&unit);
        units.push(unit);
    }
    debug!(units = units.len(), nodes = world.nodes().len(), "bolts_built");
    Ok(units)
}

fn plate_for(layout: &LayoutConfig, unit_count: usize) -> PlateRect {
    let half_span = (unit_count.max(1) as f32 - 1.0) / 2.0 * layout.bolt_spacing + PLATE_MARGIN;
    PlateRect {
        min: Vec2 {
            x: -half_span,
            y: layout.plate_bottom,
        },
        max: Vec2 {
            x: half_span,
            y: layout.plate_top,
        },
    }
}
