//! Per-frame input sampling.

use std::collections::VecDeque;

use embody_physics::MoveInput;

/// Everything the controllers read from input in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    /// Forward/back axis in [-1, 1].
    pub forward: f32,
    /// Right/left axis in [-1, 1].
    pub strafe: f32,
    /// Horizontal look delta. Positive turns right.
    pub look_x: f32,
    /// Vertical look delta. Positive pitches up.
    pub look_y: f32,
    /// Embodiment switch trigger, true on the frame it was pressed.
    pub switch_pressed: bool,
}

impl InputFrame {
    pub fn movement(&self) -> MoveInput {
        MoveInput::new(self.forward, self.strafe)
    }
}

/// Polled once per frame tick.
pub trait InputSource {
    fn poll(&mut self) -> InputFrame;
}

/// Replays a fixed queue of frames, then reports idle input.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputFrame>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Append `frame` repeated `count` times.
    pub fn then(mut self, frame: InputFrame, count: usize) -> Self {
        self.frames.extend(std::iter::repeat_n(frame, count));
        self
    }

    /// Append a single frame that presses the switch trigger.
    pub fn then_switch(self) -> Self {
        self.then(
            InputFrame {
                switch_pressed: true,
                ..InputFrame::default()
            },
            1,
        )
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputFrame {
        self.frames.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_replays_in_order() {
        let walk = InputFrame {
            forward: 1.0,
            ..InputFrame::default()
        };
        let mut input = ScriptedInput::default().then(walk, 2).then_switch();
        assert_eq!(input.remaining(), 3);
        assert_eq!(input.poll(), walk);
        assert_eq!(input.poll(), walk);
        assert!(input.poll().switch_pressed);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_exhausted_script_is_idle() {
        let mut input = ScriptedInput::new([]);
        assert_eq!(input.poll(), InputFrame::default());
        assert_eq!(input.poll(), InputFrame::default());
    }

    #[test]
    fn test_movement_axes() {
        let frame = InputFrame {
            forward: 0.5,
            strafe: -1.0,
            ..InputFrame::default()
        };
        assert_eq!(frame.movement(), MoveInput::new(0.5, -1.0));
    }
}
