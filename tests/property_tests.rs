use pca_squeeze::formatters::{calculate_reduction, format_bytes};
use pca_squeeze::{
    CompressionError, CompressionOutcome, CompressionTicket, CompressionWorkflowController,
    ResourceRole, SelectedFile, WorkflowPhase,
};
use proptest::prelude::*;
use std::time::Instant;

#[derive(Debug, Clone)]
enum Op {
    Select(usize),
    SelectNothing,
    Begin(u32),
    Succeed(usize),
    Fail,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..4096).prop_map(Op::Select),
        Just(Op::SelectNothing),
        (0u32..=500u32).prop_map(Op::Begin),
        (1usize..4096).prop_map(Op::Succeed),
        Just(Op::Fail),
    ]
}

fn resolve(ticket: CompressionTicket, result: pca_squeeze::Result<Vec<u8>>) -> CompressionOutcome {
    CompressionOutcome {
        request_id: ticket.request_id(),
        started_at: Instant::now(),
        completed_at: Instant::now(),
        result,
    }
}

fn assert_invariants(controller: &CompressionWorkflowController) {
    let state = controller.state();
    let resources = controller.resources();

    assert!(resources.live_count(ResourceRole::Original) <= 1);
    assert!(resources.live_count(ResourceRole::Result) <= 1);
    assert!(!(state.result().is_some() && state.last_error().is_some()));
    assert_eq!(state.is_busy(), controller.phase() == WorkflowPhase::Compressing);

    for handle in state.original().into_iter().chain(state.result()) {
        assert!(resources.is_live(handle));
    }
    if state.original().is_none() {
        assert_eq!(state.original_size(), 0);
    }
    if state.result().is_none() {
        assert_eq!(state.result_size(), 0);
    }
}

proptest! {
    #[test]
    fn workflow_invariants_hold_for_any_sequence(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut controller = CompressionWorkflowController::default();
        let mut pending: Vec<CompressionTicket> = Vec::new();

        for op in ops {
            match op {
                Op::Select(len) => {
                    let file = SelectedFile::new("img.png", "image/png", vec![0; len]);
                    controller.select_file(Some(file)).unwrap();
                }
                Op::SelectNothing => {
                    let before = controller.state().clone();
                    prop_assert!(!controller.select_file(None).unwrap());
                    prop_assert_eq!(controller.state(), &before);
                }
                Op::Begin(k) => {
                    let before = controller.state().clone();
                    match controller.begin_compress(k) {
                        Ok(ticket) => pending.push(ticket),
                        Err(CompressionError::NoFileSelected)
                        | Err(CompressionError::RequestInFlight)
                        | Err(CompressionError::InvalidK(_)) => {
                            prop_assert_eq!(controller.state(), &before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {}", e),
                    }
                }
                Op::Succeed(len) => {
                    if let Some(ticket) = pending.pop() {
                        controller.finish(resolve(ticket, Ok(vec![1; len])));
                    }
                }
                Op::Fail => {
                    if let Some(ticket) = pending.pop() {
                        controller.finish(resolve(
                            ticket,
                            Err(CompressionError::Service { status: 500 }),
                        ));
                    }
                }
            }
            assert_invariants(&controller);
        }
    }

    #[test]
    fn repeated_selection_keeps_one_original(sizes in prop::collection::vec(1usize..10_000, 1..20)) {
        let mut controller = CompressionWorkflowController::default();
        for size in &sizes {
            let file = SelectedFile::new("img.png", "image/png", vec![0; *size]);
            controller.select_file(Some(file)).unwrap();
            prop_assert_eq!(controller.resources().live_count(ResourceRole::Original), 1);
        }
        prop_assert_eq!(controller.state().original_size(), *sizes.last().unwrap() as u64);
    }

    #[test]
    fn format_bytes_uses_known_unit(bytes in any::<u64>()) {
        let formatted = format_bytes(bytes);
        let unit = formatted.rsplit(' ').next().unwrap();
        prop_assert!(["B", "KB", "MB", "GB"].contains(&unit));
        prop_assert!(!formatted.contains(".00 "));
    }

    #[test]
    fn reduction_within_bounds_when_shrinking(original in 1u64..1_000_000_000, fraction in 0.0f64..1.0) {
        let compressed = ((original as f64) * fraction) as u64;
        prop_assume!(compressed > 0);

        let reduction: f64 = calculate_reduction(original, compressed).parse().unwrap();
        prop_assert!((0.0..=100.0).contains(&reduction));
    }

    #[test]
    fn reduction_negative_when_growing(original in 1u64..1_000_000, extra in 1u64..1_000_000) {
        let reduction: f64 = calculate_reduction(original, original + extra).parse().unwrap();
        prop_assert!(reduction <= 0.0);
    }
}
