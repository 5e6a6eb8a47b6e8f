//! Procedure execution engine.
//!
//! Folds [`execute_step`] over a procedure's steps, threading [`State`] from
//! one step to the next. The first error halts the run.

use uuid::Uuid;

use super::error::{ProcedureError, ProcedureResult};
use super::schema::{Automation, Procedure, Step};
use super::state::State;
use crate::interaction::{ConsoleSink, InteractionSink};
use crate::render::{MarkdownRenderer, Renderer};

/// The renderer and interaction sink a run talks to.
pub struct RunConfig<R = Box<dyn Renderer>, S = Box<dyn InteractionSink>> {
    pub renderer: R,
    pub sink: S,
}

impl<R: Renderer, S: InteractionSink> RunConfig<R, S> {
    pub fn new(renderer: R, sink: S) -> Self {
        Self { renderer, sink }
    }
}

impl Default for RunConfig {
    /// Markdown renderer and a console sink on stdin/stdout.
    fn default() -> Self {
        Self { renderer: Box::new(MarkdownRenderer::new()), sink: Box::new(ConsoleSink::stdio()) }
    }
}

/// Execute a single step and return the resulting state.
///
/// Manual steps render their instructions and wait for confirmation; state is
/// returned untouched. Automated steps gather their inputs, invoke the
/// operation and store the result under the output key, if one is set.
pub fn execute_step<R, S>(
    state: State,
    step: &Step,
    renderer: &R,
    sink: &mut S,
) -> ProcedureResult<State>
where
    R: Renderer + ?Sized,
    S: InteractionSink + ?Sized,
{
    match &step.automation {
        None => execute_manual(state, step, renderer, sink),
        Some(automation) => execute_automated(state, step, automation, renderer, sink),
    }
}

fn execute_manual<R, S>(
    state: State,
    step: &Step,
    renderer: &R,
    sink: &mut S,
) -> ProcedureResult<State>
where
    R: Renderer + ?Sized,
    S: InteractionSink + ?Sized,
{
    sink.output(&renderer.step_title(&state, step))?;
    sink.output(&renderer.step_instructions_for_execution(&state, step)?)?;
    sink.prompt_step_completion()?;
    Ok(state)
}

fn execute_automated<R, S>(
    mut state: State,
    step: &Step,
    automation: &Automation,
    renderer: &R,
    sink: &mut S,
) -> ProcedureResult<State>
where
    R: Renderer + ?Sized,
    S: InteractionSink + ?Sized,
{
    sink.output(&renderer.step_title(&state, step))?;
    sink.output(&renderer.automated_note_for_execution(&state, step))?;

    let inputs = state.gather(automation.inputs(), &step.title)?;
    let result = automation
        .invoke(&inputs)
        .map_err(|source| ProcedureError::AutomationFailure { step: step.title.clone(), source })?;

    match automation.output() {
        Some(key) => {
            tracing::debug!(step = %step.title, key, value = %result, "Storing automation output");
            state.insert(key, result.clone());
            sink.output(&renderer.automated_output(&state, automation, &result))?;
        }
        None => {
            tracing::debug!(step = %step.title, "Discarding automation result");
        }
    }

    Ok(state)
}

impl Procedure {
    /// Run the procedure from an empty state.
    pub fn execute<R, S>(&self, config: &mut RunConfig<R, S>) -> ProcedureResult<State>
    where
        R: Renderer,
        S: InteractionSink,
    {
        self.execute_with_state(config, State::new())
    }

    /// Run the procedure with the default Markdown renderer and console sink.
    ///
    /// A fresh configuration is built on every call.
    pub fn execute_default(&self) -> ProcedureResult<State> {
        let mut config: RunConfig = RunConfig::default();
        self.execute(&mut config)
    }

    /// Run the procedure starting from a host-provided state.
    pub fn execute_with_state<R, S>(
        &self,
        config: &mut RunConfig<R, S>,
        initial: State,
    ) -> ProcedureResult<State>
    where
        R: Renderer,
        S: InteractionSink,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("procedure", %run_id, title = %self.title);
        let _guard = span.enter();

        tracing::info!(steps = self.step_count(), seeded = initial.len(), "Starting procedure");

        let RunConfig { renderer, sink } = config;
        let renderer: &R = renderer;
        sink.output(&renderer.header(self))?;
        sink.prompt_to_begin()?;

        let state = self.steps().iter().enumerate().try_fold(initial, |state, (i, step)| {
            tracing::info!(
                step = i + 1,
                title = %step.title,
                automated = step.is_automated(),
                "Executing step"
            );
            execute_step(state, step, renderer, &mut *sink)
        })?;

        sink.output(&renderer.completion(self))?;
        tracing::info!(keys = state.len(), "Procedure completed");

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::interaction::{RecordingSink, SinkEvent};
    use crate::procedure::Value;

    fn recording() -> RunConfig<MarkdownRenderer, RecordingSink> {
        RunConfig::new(MarkdownRenderer::new(), RecordingSink::new())
    }

    fn constant(value: &'static str) -> Automation {
        Automation::new(move |_| Ok(Value::from(value)))
    }

    #[test]
    fn test_empty_procedure() {
        let procedure = Procedure::new("Empty", "Nothing to do");
        let mut config = recording();

        let state = procedure.execute(&mut config).unwrap();

        assert!(state.is_empty());
        assert_eq!(
            config.sink.events(),
            [
                SinkEvent::Output("\n# Empty\n\nNothing to do\n\n".to_string()),
                SinkEvent::BeginPrompt,
                SinkEvent::Output("done!\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_hello_world_scenario() {
        let procedure = Procedure::new("procedure", "description")
            .add_manual_step("my step", "say hi")
            .add_automated_step("run step", constant("world").with_output("name"))
            .add_manual_step("greet", "hello, ${name}");
        let mut config = recording();

        let state = procedure.execute(&mut config).unwrap();

        assert_eq!(
            config.sink.events(),
            [
                SinkEvent::Output("\n# procedure\n\ndescription\n\n".to_string()),
                SinkEvent::BeginPrompt,
                SinkEvent::Output("## my step\n\n".to_string()),
                SinkEvent::Output("say hi\n\n".to_string()),
                SinkEvent::CompletionPrompt,
                SinkEvent::Output("## run step\n\n".to_string()),
                SinkEvent::Output("Executing step automatically.\n\n".to_string()),
                SinkEvent::Output("**Outputs**:\n  - `name`: world\n\n".to_string()),
                SinkEvent::Output("## greet\n\n".to_string()),
                SinkEvent::Output("hello, world\n\n".to_string()),
                SinkEvent::CompletionPrompt,
                SinkEvent::Output("done!\n".to_string()),
            ]
        );
        assert_eq!(config.sink.begin_prompts(), 1);
        assert_eq!(config.sink.completion_prompts(), 2);

        let expected: State = [("name", "world")].into_iter().collect();
        assert_eq!(state, expected);
    }

    #[test]
    fn test_completion_prompts_match_manual_steps() {
        let procedure = Procedure::new("mixed", "")
            .add_automated_step("a1", constant("x"))
            .add_manual_step("m1", "one")
            .add_automated_step("a2", constant("y").with_output("y"))
            .add_manual_step("m2", "two")
            .add_manual_step("m3", "three")
            .add_automated_step("a3", constant("z"));
        let mut config = recording();

        procedure.execute(&mut config).unwrap();

        assert_eq!(config.sink.completion_prompts(), procedure.manual_step_count());
        assert_eq!(config.sink.completion_prompts(), 3);
    }

    #[test]
    fn test_output_visible_only_after_producing_step() {
        let seen: Rc<RefCell<Vec<Option<Value>>>> = Rc::default();
        let probe = |seen: &Rc<RefCell<Vec<Option<Value>>>>| {
            let seen = Rc::clone(seen);
            Automation::new(move |args| {
                seen.borrow_mut().push(args.first().cloned());
                Ok(Value::Null)
            })
        };

        // Nothing has produced `k` yet
        let before = Procedure::new("before", "").add_manual_step("read", "${k}");
        let err = before.execute(&mut recording()).unwrap_err();
        assert!(matches!(err, ProcedureError::MissingStateKey { key, .. } if key == "k"));

        let procedure = Procedure::new("after", "")
            .add_automated_step("produce", constant("v").with_output("k"))
            .add_automated_step("read once", probe(&seen).with_inputs(["k"]))
            .add_manual_step("unrelated", "text")
            .add_automated_step("read again", probe(&seen).with_inputs(["k"]));

        let state = procedure.execute(&mut recording()).unwrap();

        assert_eq!(*seen.borrow(), vec![Some(Value::from("v")), Some(Value::from("v"))]);
        assert_eq!(state.get("k"), Some(&Value::from("v")));
    }

    #[test]
    fn test_later_output_overwrites_earlier() {
        let procedure = Procedure::new("overwrite", "")
            .add_automated_step("first", constant("1").with_output("k"))
            .add_manual_step("show", "k=${k}")
            .add_automated_step("second", constant("2").with_output("k"));
        let mut config = recording();

        let state = procedure.execute(&mut config).unwrap();

        assert!(config.sink.transcript().contains("k=1"));
        assert_eq!(state.get("k"), Some(&Value::from("2")));
    }

    #[test]
    fn test_automation_without_output_leaves_state_unchanged() {
        let procedure = Procedure::new("discard", "")
            .add_automated_step("noisy", constant("ignored"));
        let mut config = recording();
        let seed: State = [("existing", 1)].into_iter().collect();

        let state = procedure.execute_with_state(&mut config, seed.clone()).unwrap();

        assert_eq!(state, seed);
        assert!(!config.sink.transcript().contains("Outputs"));
    }

    #[test]
    fn test_missing_input_does_not_invoke_automation() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let procedure = Procedure::new("missing", "")
            .add_automated_step(
                "needs input",
                Automation::new(move |_| {
                    counter.set(counter.get() + 1);
                    Ok(Value::Null)
                })
                .with_inputs(["never_set"]),
            )
            .add_manual_step("unreachable", "should not render");
        let mut config = recording();

        let err = procedure.execute(&mut config).unwrap_err();

        assert!(matches!(
            err,
            ProcedureError::MissingStateKey { ref step, ref key }
                if step == "needs input" && key == "never_set"
        ));
        assert_eq!(calls.get(), 0);
        assert!(!config.sink.transcript().contains("should not render"));
        assert!(!config.sink.transcript().contains("done!"));
    }

    #[test]
    fn test_automation_failure_halts_run() {
        let procedure = Procedure::new("failing", "")
            .add_automated_step("boom", Automation::new(|_| anyhow::bail!("disk full")))
            .add_manual_step("after", "never shown");
        let mut config = recording();

        let err = procedure.execute(&mut config).unwrap_err();

        match err {
            ProcedureError::AutomationFailure { step, source } => {
                assert_eq!(step, "boom");
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(config.sink.completion_prompts(), 0);
        assert!(!config.sink.transcript().contains("never shown"));
    }

    #[test]
    fn test_inputs_passed_in_declared_order() {
        let procedure = Procedure::new("order", "")
            .add_automated_step("a", constant("first").with_output("a"))
            .add_automated_step("b", constant("second").with_output("b"))
            .add_automated_step(
                "join",
                Automation::new(|args| {
                    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
                    Ok(Value::from(parts.join("+")))
                })
                .with_inputs(["b", "a"])
                .with_output("joined"),
            );

        let state = procedure.execute(&mut recording()).unwrap();
        assert_eq!(state.get("joined"), Some(&Value::from("second+first")));
    }

    #[test]
    fn test_each_execution_starts_fresh() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let procedure = Procedure::new("twice", "").add_automated_step(
            "count",
            Automation::new(move |_| {
                counter.set(counter.get() + 1);
                Ok(Value::from(i64::from(counter.get())))
            })
            .with_output("n"),
        );

        let first = procedure.execute(&mut recording()).unwrap();
        let second = procedure.execute(&mut recording()).unwrap();

        assert_eq!(first.get("n"), Some(&Value::Integer(1)));
        assert_eq!(second.get("n"), Some(&Value::Integer(2)));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_seeded_state_feeds_placeholders() {
        let procedure = Procedure::new("seeded", "").add_manual_step("deploy", "Deploy ${env}");
        let mut config = recording();
        let seed: State = [("env", "staging")].into_iter().collect();

        procedure.execute_with_state(&mut config, seed).unwrap();

        assert!(config.sink.transcript().contains("Deploy staging\n\n"));
    }

    #[test]
    fn test_automated_step_ignores_instructions() {
        let procedure = Procedure::new("p", "d").add_step(
            "a",
            Some("secret text".to_string()),
            Some(constant("v").with_output("k")),
        );
        let mut config = recording();

        let state = procedure.execute(&mut config).unwrap();

        assert_eq!(state.get("k"), Some(&Value::from("v")));
        assert!(!config.sink.transcript().contains("secret text"));
        assert!(config.sink.transcript().contains("Executing step automatically."));
        assert_eq!(config.sink.completion_prompts(), 0);
    }

    #[test]
    fn test_execute_step_directly() {
        let mut sink = RecordingSink::new();
        let renderer = MarkdownRenderer::new();
        let step = Step::automated("produce", constant("v").with_output("k"));

        let state = execute_step(State::new(), &step, &renderer, &mut sink).unwrap();

        assert_eq!(state.get("k"), Some(&Value::from("v")));
        assert_eq!(sink.completion_prompts(), 0);
        assert_eq!(sink.begin_prompts(), 0);
    }

    #[test]
    fn test_boxed_config() {
        let procedure = Procedure::new("boxed", "").add_manual_step("m", "text");
        let mut config: RunConfig = RunConfig {
            renderer: Box::new(MarkdownRenderer::new().with_completion_message("finished")),
            sink: Box::new(RecordingSink::new()),
        };

        assert!(procedure.execute(&mut config).is_ok());
    }
}
