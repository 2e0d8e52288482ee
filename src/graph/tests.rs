#[cfg(test)]
mod tests {

    use approx::assert_abs_diff_eq;

    use crate::error::NanogradError;
    use crate::graph::Engine;
    use crate::graph::node::NodeId;
    use crate::graph::op::Add;

    /// Helper function to check if two floating point values are approximately equal
    fn approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_leaf_creation() {
        let mut graph = Engine::new();
        let a = graph.create_value(1.5, true);

        assert_eq!(graph.get_data(a), Some(1.5));
        assert!(graph.is_leaf(a));
        // A fresh leaf has never been touched by a backward pass.
        assert_eq!(graph.get_gradient(a), None);
    }

    #[test]
    fn test_node_id_uniqueness() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
        assert!(id2.0 > id1.0);
    }

    #[test]
    fn test_forward_values() {
        let mut graph = Engine::new();
        let a = graph.create_value(10.0, true);
        let b = graph.create_value(4.0, true);

        let sum = graph.add(a, b).unwrap();
        let diff = graph.sub(a, b).unwrap();
        let prod = graph.mul(a, b).unwrap();
        let quot = graph.div(a, b).unwrap();

        assert_eq!(graph.get_data(sum), Some(14.0));
        assert_eq!(graph.get_data(diff), Some(6.0));
        assert_eq!(graph.get_data(prod), Some(40.0));
        assert_eq!(graph.get_data(quot), Some(2.5));

        // Operands are never mutated by building on top of them.
        assert_eq!(graph.get_data(a), Some(10.0));
        assert_eq!(graph.get_data(b), Some(4.0));
    }

    #[test]
    fn test_mul_backward_product_rule() {
        let mut graph = Engine::new();
        let a = graph.create_value(10.0, true);
        let b = graph.create_value(3.0, true);

        let out = graph.mul(a, b).unwrap();
        graph.backward(out).unwrap();

        assert_eq!(graph.get_data(out), Some(30.0));
        assert_eq!(graph.get_gradient(a), Some(3.0));
        assert_eq!(graph.get_gradient(b), Some(10.0));
        // The root keeps its seed.
        assert_eq!(graph.get_gradient(out), Some(1.0));
    }

    #[test]
    fn test_add_sub_backward() {
        let mut graph = Engine::new();
        let a = graph.create_value(2.0, true);
        let b = graph.create_value(7.0, true);

        let sum = graph.add(a, b).unwrap();
        graph.backward(sum).unwrap();
        assert_eq!(graph.get_gradient(a), Some(1.0));
        assert_eq!(graph.get_gradient(b), Some(1.0));

        graph.zero_gradients();
        let diff = graph.sub(a, b).unwrap();
        graph.backward(diff).unwrap();
        assert_eq!(graph.get_gradient(a), Some(1.0));
        assert_eq!(graph.get_gradient(b), Some(-1.0));
    }

    #[test]
    fn test_div_backward() {
        let mut graph = Engine::new();
        let a = graph.create_value(6.0, true);
        let b = graph.create_value(2.0, true);

        let out = graph.div(a, b).unwrap();
        graph.backward(out).unwrap();

        assert_eq!(graph.get_data(out), Some(3.0));
        // d/da(a/b) = 1/b, d/db(a/b) = -a/b²
        assert_eq!(graph.get_gradient(a), Some(0.5));
        assert_eq!(graph.get_gradient(b), Some(-1.5));
    }

    #[test]
    fn test_pow_backward_constant_exponent() {
        let mut graph = Engine::new();
        let a = graph.create_value(2.0, true);
        let p = graph.create_value(3.0, true);

        let out = graph.pow(a, p).unwrap();
        graph.backward(out).unwrap();

        assert_abs_diff_eq!(graph.get_data(out).unwrap(), 8.0, epsilon = 1e-12);
        // d/da(a^p) = p * a^(p-1) = 3 * 4 = 12
        assert_abs_diff_eq!(graph.get_gradient(a).unwrap(), 12.0, epsilon = 1e-12);
        // The exponent is a constant: it is visited but receives nothing.
        assert_eq!(graph.get_gradient(p), Some(0.0));
    }

    #[test]
    fn test_relu_backward() {
        let mut graph = Engine::new();

        let pos = graph.create_value(3.0, true);
        let out_pos = graph.relu(pos).unwrap();
        graph.backward(out_pos).unwrap();
        assert_eq!(graph.get_data(out_pos), Some(3.0));
        assert_eq!(graph.get_gradient(pos), Some(1.0));

        let neg = graph.create_value(-2.0, true);
        let out_neg = graph.relu(neg).unwrap();
        graph.backward(out_neg).unwrap();
        assert_eq!(graph.get_data(out_neg), Some(0.0));
        // The unit was inactive, nothing passes through.
        assert_eq!(graph.get_gradient(neg), Some(0.0));
    }

    #[test]
    fn test_tanh_backward() {
        let mut graph = Engine::new();
        let a = graph.create_value(0.7, true);

        let out = graph.tanh(a).unwrap();
        graph.backward(out).unwrap();

        let expected = 1.0 - 0.7f64.tanh() * 0.7f64.tanh();
        assert!(approx_equal(
            graph.get_gradient(a).unwrap(),
            expected,
            1e-12
        ));
    }

    #[test]
    fn test_exp_backward() {
        let mut graph = Engine::new();
        let a = graph.create_value(1.3, true);

        let out = graph.exp(a).unwrap();
        graph.backward(out).unwrap();

        // d/da(e^a) = e^a
        assert!(approx_equal(
            graph.get_gradient(a).unwrap(),
            1.3f64.exp(),
            1e-12
        ));
    }

    #[test]
    fn test_log_backward() {
        let mut graph = Engine::new();
        let a = graph.create_value(4.0, true);

        let out = graph.log(a).unwrap();
        graph.backward(out).unwrap();

        assert!(approx_equal(graph.get_data(out).unwrap(), 4.0f64.ln(), 1e-12));
        assert_eq!(graph.get_gradient(a), Some(0.25));
    }

    #[test]
    fn test_shared_subexpression_accumulation() {
        // out = a*a + a, so d(out)/da = 2a + 1. The node for `a` is reached
        // through three distinct paths and the contributions accumulate.
        let mut graph = Engine::new();
        let a = graph.create_value(5.0, true);

        let square = graph.mul(a, a).unwrap();
        let out = graph.add(square, a).unwrap();
        graph.backward(out).unwrap();

        assert_eq!(graph.get_data(out), Some(30.0));
        assert_eq!(graph.get_gradient(a), Some(11.0));
    }

    #[test]
    fn test_topological_order_law() {
        let mut graph = Engine::new();
        let a = graph.create_value(1.0, true);
        let b = graph.create_value(2.0, true);

        let c = graph.add(a, b).unwrap();
        let d = graph.mul(c, a).unwrap();
        let e = graph.tanh(d).unwrap();

        let order = graph.topological_order(e).unwrap();

        // Every node appears exactly once and after all of its operands;
        // the root comes last.
        assert_eq!(*order.last().unwrap(), e);
        for (pos, &node_id) in order.iter().enumerate() {
            let node = graph.get_node(node_id).unwrap();
            for input_id in &node.inputs {
                let input_pos = order.iter().position(|id| id == input_id).unwrap();
                assert!(
                    input_pos < pos,
                    "operand {} of {} emitted after its consumer",
                    input_id,
                    node_id
                );
            }
        }
    }

    #[test]
    fn test_backward_on_leaf_is_noop() {
        let mut graph = Engine::new();
        let a = graph.create_value(42.0, true);

        graph.backward(a).unwrap();

        // No seeding, no traversal.
        assert_eq!(graph.get_gradient(a), None);
    }

    #[test]
    fn test_preseeded_root_gradient() {
        // A caller composing a custom loss gradient seeds the root before
        // the pass; the seed must not be overwritten by the 1.0 default.
        let mut graph = Engine::new();
        let a = graph.create_value(10.0, true);
        let b = graph.create_value(3.0, true);

        let out = graph.mul(a, b).unwrap();
        graph.set_gradient(out, 2.0);
        graph.backward(out).unwrap();

        assert_eq!(graph.get_gradient(out), Some(2.0));
        assert_eq!(graph.get_gradient(a), Some(6.0));
        assert_eq!(graph.get_gradient(b), Some(20.0));
    }

    #[test]
    fn test_repeated_backward_accumulates() {
        let mut graph = Engine::new();
        let a = graph.create_value(10.0, true);
        let b = graph.create_value(3.0, true);
        let out = graph.mul(a, b).unwrap();

        graph.backward(out).unwrap();
        graph.backward(out).unwrap();
        // Without a reset the second pass runs with the root already at
        // 1.0 and adds a second round of contributions.
        assert_eq!(graph.get_gradient(a), Some(6.0));

        graph.zero_gradients();
        assert_eq!(graph.get_gradient(a), None);
        graph.backward(out).unwrap();
        assert_eq!(graph.get_gradient(a), Some(3.0));
    }

    #[test]
    fn test_domain_errors_propagate_as_nan_inf() {
        let mut graph = Engine::new();

        let one = graph.create_value(1.0, true);
        let zero = graph.create_value(0.0, true);
        let by_zero = graph.div(one, zero).unwrap();
        assert_eq!(graph.get_data(by_zero), Some(f64::INFINITY));

        let zero_by_zero = graph.div(zero, zero).unwrap();
        assert!(graph.get_data(zero_by_zero).unwrap().is_nan());

        let neg = graph.create_value(-1.0, true);
        let log_neg = graph.log(neg).unwrap();
        assert!(graph.get_data(log_neg).unwrap().is_nan());

        let log_zero = graph.log(zero).unwrap();
        assert_eq!(graph.get_data(log_zero), Some(f64::NEG_INFINITY));

        let base = graph.create_value(-2.0, true);
        let frac = graph.create_value(0.5, true);
        let nan_pow = graph.pow(base, frac).unwrap();
        assert!(graph.get_data(nan_pow).unwrap().is_nan());

        // The backward pass propagates the same payloads instead of failing.
        graph.backward(by_zero).unwrap();
        assert_eq!(graph.get_gradient(one), Some(f64::INFINITY));
        assert_eq!(graph.get_gradient(zero), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let mut graph = Engine::new();
        let mut other = Engine::new();

        let a = graph.create_value(1.0, true);
        let foreign = other.create_value(2.0, true);

        let result = graph.add(a, foreign);
        assert_eq!(
            result,
            Err(NanogradError::NodeNotFound { id: foreign })
        );
    }

    #[test]
    fn test_arity_is_validated() {
        let mut graph = Engine::new();
        let a = graph.create_value(1.0, true);

        let result = graph.apply_operation(Box::new(Add), vec![a]);
        assert_eq!(
            result,
            Err(NanogradError::ArityMismatch {
                op: "Add".to_string(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_long_chain_has_no_capacity_ceiling() {
        // Traversal state grows dynamically, so graphs well past any fixed
        // buffer size backpropagate fine.
        let mut graph = Engine::new();
        let one = graph.create_value(1.0, true);
        let mut out = graph.create_value(0.0, true);
        for _ in 0..2500 {
            out = graph.add(out, one).unwrap();
        }

        graph.backward(out).unwrap();

        assert_eq!(graph.get_data(out), Some(2500.0));
        assert_eq!(graph.get_gradient(one), Some(2500.0));
        assert_eq!(graph.num_nodes(), 2502);
    }
}
