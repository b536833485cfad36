//! Behaviour tests for the primitive library, driven through the public
//! `run` entry point with recording test doubles.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use crate::eval::Interpreter;
use crate::host::{BufferStream, RecordingTurtle};

struct Fixture {
    it: Interpreter,
    out: Rc<RefCell<String>>,
    log: Rc<RefCell<Vec<String>>>,
}

fn fixture() -> Fixture {
    let stream = BufferStream::new();
    let out = stream.buffer();
    let turtle = RecordingTurtle::new();
    let log = turtle.log();
    let it = Interpreter::new(Box::new(turtle), Box::new(stream));
    Fixture { it, out, log }
}

fn fixture_with_reads(lines: &[&str]) -> Fixture {
    let mut stream = BufferStream::new();
    for line in lines {
        stream.push_read(*line);
    }
    let out = stream.buffer();
    let turtle = RecordingTurtle::new();
    let log = turtle.log();
    let it = Interpreter::new(Box::new(turtle), Box::new(stream));
    Fixture { it, out, log }
}

/// Run a program and return the stream output.
fn run(src: &str) -> String {
    let mut f = fixture();
    f.it.run(src).unwrap_or_else(|e| panic!("program failed: {e}\nsource: {src}"));
    let text = f.out.borrow().clone();
    text
}

/// Run a program expected to fail and return the error message.
fn run_err(src: &str) -> String {
    let mut f = fixture();
    f.it.run(src).expect_err("program should fail").message
}

// ===========================================================================
// Printing
// ===========================================================================

#[test]
fn print_show_type_decoration() {
    assert_eq!(run("pr [a b [c d]]"), "a b [c d]\n");
    assert_eq!(run("show [a b [c d]]"), "[a b [c d]]\n");
    assert_eq!(run("type \"a type \"b"), "ab");
    assert_eq!(run("(pr 1 2 3)"), "1 2 3\n");
    assert_eq!(run("pr {1 2 3}"), "{1 2 3}\n");
    assert_eq!(run("show {a}@0"), "{a}@0\n");
}

#[test]
fn numbers_print_in_shortest_form() {
    assert_eq!(run("pr 2 + 1"), "3\n");
    assert_eq!(run("pr 0.5 + 0.25"), "0.75\n");
    assert_eq!(run("pr 1 / 4"), "0.25\n");
}

// ===========================================================================
// Words, lists, arrays
// ===========================================================================

#[test]
fn constructors_and_selectors() {
    assert_eq!(run("pr word \"fo \"o"), "foo\n");
    assert_eq!(run("show list 1 2"), "[1 2]\n");
    assert_eq!(run("show (list 1 2 3)"), "[1 2 3]\n");
    assert_eq!(run("show se [a b] [c]"), "[a b c]\n");
    assert_eq!(run("show fput 1 [2 3]"), "[1 2 3]\n");
    assert_eq!(run("show lput 3 [1 2]"), "[1 2 3]\n");
    assert_eq!(run("pr fput \"a \"bc"), "abc\n");
    assert_eq!(run("pr first [a b c]"), "a\n");
    assert_eq!(run("pr first \"word"), "w\n");
    assert_eq!(run("pr last [a b c]"), "c\n");
    assert_eq!(run("show bf [a b c]"), "[b c]\n");
    assert_eq!(run("pr bf \"word"), "ord\n");
    assert_eq!(run("show bl [a b c]"), "[a b]\n");
    assert_eq!(run("pr item 2 [a b c]"), "b\n");
    assert_eq!(run("pr item 2 \"abc"), "b\n");
    assert_eq!(run("pr count [a b c]"), "3\n");
    assert_eq!(run("pr count \"hello"), "5\n");
    assert_eq!(run("show reverse [1 2 3]"), "[3 2 1]\n");
    assert_eq!(run("pr reverse \"abc"), "cba\n");
    assert_eq!(run("show firsts [[a b] [c d]]"), "[a c]\n");
    assert_eq!(run("show bfs [[a b] [c d]]"), "[[b] [d]]\n");
    assert_eq!(run("show remove \"b [a b c b]"), "[a c]\n");
    assert_eq!(run("show remdup [a b a c a]"), "[b c a]\n");
    assert_eq!(run("pr quoted \"a"), "\"a\n");
    assert_eq!(run("pr ascii \"A"), "65\n");
    assert_eq!(run("pr char 97"), "a\n");
    assert_eq!(run("pr uppercase \"abc"), "ABC\n");
    assert_eq!(run("pr lowercase \"ABC"), "abc\n");
    assert_eq!(run("show combine \"a \"bc"), "abc\n");
    assert_eq!(run("show combine \"a [b]"), "[a b]\n");
    assert_eq!(run("show member 2 [1 2 3]"), "[2 3]\n");
    assert_eq!(run("show member 9 [1 2]"), "[]\n");
    assert_eq!(run("pr member \"e \"please"), "ease\n");
}

#[test]
fn array_operations() {
    assert_eq!(run("show array 3"), "{[] [] []}\n");
    assert_eq!(run("pr count array 5"), "5\n");
    assert_eq!(run("make \"a {10 20 30} pr item 2 :a"), "20\n");
    assert_eq!(run("make \"a (listtoarray [5 6 7] 0) pr item 0 :a"), "5\n");
    assert_eq!(run("show arraytolist {1 2 3}"), "[1 2 3]\n");
    assert_eq!(run("make \"a {1 2 3} setitem 2 :a 9 pr item 2 :a"), "9\n");
    assert_eq!(run("show mditem [1 2] mdarray [2 2]"), "[]\n");
    assert_eq!(
        run("make \"a mdarray [2 2] mdsetitem [1 2] :a 7 pr mditem [1 2] :a"),
        "7\n"
    );
}

#[test]
fn array_index_respects_origin() {
    assert_eq!(run("make \"a {9 8 7}@0 pr item 0 :a"), "9\n");
    assert_eq!(run_err("pr item 3 {9 8 7}@0"), "ITEM: Index out of bounds");
}

#[test]
fn circular_array_assignment_is_rejected() {
    assert_eq!(
        run_err("make \"a {1 2} setitem 1 :a :a"),
        "SETITEM: Can't create circular array"
    );
    assert_eq!(
        run_err("make \"a {1 2} make \"l list 5 :a setitem 2 :a :l"),
        "SETITEM: Can't create circular array"
    );
}

#[test]
fn dot_mutators() {
    assert_eq!(run("make \"l [1 2 3] .setfirst :l 9 show :l"), "[9 2 3]\n");
    assert_eq!(run("make \"l [1 2 3] .setbf :l [8 9] show :l"), "[1 8 9]\n");
    assert_eq!(run_err(".setbf \"w [1]"), ".SETBF: Expected list");
    assert_eq!(run_err(".setbf [] [1]"), ".SETBF: Expected list");
}

#[test]
fn deep_copy_on_make_but_arrays_alias() {
    // Lists: MAKE deep-copies, so mutating b leaves a untouched.
    assert_eq!(
        run("make \"a [1 2 3] make \"b :a .setfirst :b 9 show :a"),
        "[1 2 3]\n"
    );
    // Arrays: aliased across MAKE.
    assert_eq!(
        run("make \"a {1 2 3} make \"b :a setitem 1 :b 9 pr item 1 :a"),
        "9\n"
    );
}

#[test]
fn stacks_and_queues() {
    assert_eq!(
        run("make \"s [] push \"s 1 push \"s 2 show :s"),
        "[2 1]\n"
    );
    assert_eq!(run("make \"s [1 2 3] pr pop \"s show :s"), "1\n[2 3]\n");
    assert_eq!(
        run("make \"q [] queue \"q 1 queue \"q 2 show :q"),
        "[1 2]\n"
    );
    assert_eq!(run("make \"q [1 2] pr dequeue \"q show :q"), "1\n[2]\n");
}

// ===========================================================================
// Predicates and equality
// ===========================================================================

#[test]
fn type_predicates() {
    assert_eq!(run("pr wordp \"a"), "true\n");
    assert_eq!(run("pr wordp [a]"), "false\n");
    assert_eq!(run("pr listp [a]"), "true\n");
    assert_eq!(run("pr arrayp {1}"), "true\n");
    assert_eq!(run("pr numberp 12"), "true\n");
    assert_eq!(run("pr numberp \"12"), "true\n");
    assert_eq!(run("pr numberp \"a"), "false\n");
    assert_eq!(run("pr emptyp []"), "true\n");
    assert_eq!(run("pr emptyp \"a"), "false\n");
}

#[test]
fn equality_follows_the_value_model() {
    assert_eq!(run("pr equalp \"3 3"), "true\n");
    assert_eq!(run("pr equalp \"3.0 3"), "true\n");
    assert_eq!(run("pr equalp [1 [2]] [1 [2]]"), "true\n");
    // Arrays compare by identity only.
    assert_eq!(run("pr equalp {1} {1}"), "false\n");
    assert_eq!(run("make \"a {1} pr equalp :a :a"), "true\n");
    assert_eq!(run("pr memberp 2 [1 2 3]"), "true\n");
    assert_eq!(run("pr memberp \"e \"please"), "true\n");
    assert_eq!(run("pr substringp \"ea \"please"), "true\n");
    assert_eq!(run("pr beforep \"apple \"banana"), "true\n");
    assert_eq!(run("make \"a [1] make \"b :a pr .eq :a :b"), "false\n");
    assert_eq!(run("make \"a [1] pr .eq :a :a"), "true\n");
}

// ===========================================================================
// Arithmetic
// ===========================================================================

#[test]
fn arithmetic_primitives() {
    assert_eq!(run("pr sum 1 2"), "3\n");
    assert_eq!(run("pr difference 5 3"), "2\n");
    assert_eq!(run("pr minus 4"), "-4\n");
    assert_eq!(run("pr product 3 4"), "12\n");
    assert_eq!(run("pr quotient 10 4"), "2.5\n");
    assert_eq!(run("pr remainder 7 3"), "1\n");
    assert_eq!(run("pr remainder -7 3"), "-1\n");
    assert_eq!(run("pr modulo -7 3"), "2\n");
    assert_eq!(run("pr modulo 7 -3"), "-2\n");
    assert_eq!(run("pr int 3.7"), "3\n");
    assert_eq!(run("pr int -3.7"), "-3\n");
    assert_eq!(run("pr round 2.5"), "3\n");
    assert_eq!(run("pr round -2.5"), "-2\n");
    assert_eq!(run("pr sqrt 16"), "4\n");
    assert_eq!(run("pr power 2 10"), "1024\n");
    assert_eq!(run("pr exp 0"), "1\n");
    assert_eq!(run("pr round log10 1000"), "3\n");
    assert_eq!(run("pr ln 1"), "0\n");
    assert_eq!(run("pr sin 90"), "1\n");
    assert_eq!(run("pr cos 0"), "1\n");
    assert_eq!(run("pr arctan 0"), "0\n");
    assert_eq!(run("pr round arctan 1"), "45\n");
    assert_eq!(run("show iseq 1 4"), "[1 2 3 4]\n");
    assert_eq!(run("show iseq 3 1"), "[3 2 1]\n");
    assert_eq!(run("show rseq 0 1 3"), "[0 0.5 1]\n");
    assert_eq!(run("pr bitand 12 10"), "8\n");
    assert_eq!(run("pr bitor 12 10"), "14\n");
    assert_eq!(run("pr bitxor 12 10"), "6\n");
    assert_eq!(run("pr bitnot 0"), "-1\n");
    assert_eq!(run("pr ashift 1 4"), "16\n");
    assert_eq!(run("pr ashift -16 -2"), "-4\n");
    assert_eq!(run("pr lshift 16 -2"), "4\n");
    assert_eq!(run("pr form 2.5 8 2"), "    2.50\n");
}

#[test]
fn random_stays_in_range_and_reseeds() {
    assert_eq!(run("rerandom repeat 20 [make \"n random 6 if or :n < 0 :n > 5 [pr \"bad]]"), "");
    // Same seed, same sequence.
    let first = run("rerandom pr random 1000000");
    let second = run("rerandom pr random 1000000");
    assert_eq!(first, second);
    let third = run("(rerandom 42) pr random 1000000");
    let fourth = run("(rerandom 42) pr random 1000000");
    assert_eq!(third, fourth);
}

#[test]
fn numberwang_flips_a_coin() {
    let out = run("rerandom repeat 10 [type numberwang 7]");
    assert!(out.chars().all(|c| c == '0' || c == '1'));
    assert_eq!(out.len(), 10);
}

// ===========================================================================
// Control flow
// ===========================================================================

#[test]
fn repeat_and_repcount() {
    assert_eq!(run("repeat 3 [pr repcount]"), "1\n2\n3\n");
    assert_eq!(run("repeat 2 [repeat 2 [type #] type \".]"), "12.12.");
    assert_eq!(run("pr repcount"), "-1\n");
}

#[test]
fn if_and_ifelse() {
    assert_eq!(run("make \"x 10 if :x > 5 [pr \"big] [pr \"small]"), "big\n");
    assert_eq!(run("make \"x 1 if :x > 5 [pr \"big] [pr \"small]"), "small\n");
    assert_eq!(run("ifelse 0 [pr \"t] [pr \"f]"), "f\n");
    assert_eq!(run("pr ifelse 1 [\"yes] [\"no]"), "yes\n");
    // Condition as a list is re-parsed and evaluated.
    assert_eq!(run("make \"x 3 if [:x < 5] [pr \"ok]"), "ok\n");
}

#[test]
fn test_ift_iff_use_the_frame_slot() {
    assert_eq!(run("test 1 < 2 ift [pr \"yes] iff [pr \"no]"), "yes\n");
    // A procedure's TEST is its own; the caller's is untouched.
    let src = "to f test \"false end test \"true f ift [pr \"outer]";
    assert_eq!(run(src), "outer\n");
    assert_eq!(run_err("ift [pr 1]"), "IFTRUE: Called without TEST");
}

#[test]
fn while_family() {
    assert_eq!(
        run("make \"i 0 while [:i < 3] [make \"i :i + 1 pr :i]"),
        "1\n2\n3\n"
    );
    assert_eq!(
        run("make \"i 0 until [:i = 2] [make \"i :i + 1 pr :i]"),
        "1\n2\n"
    );
    assert_eq!(
        run("make \"i 5 do.while [pr :i make \"i :i - 1] [:i > 3]"),
        "5\n4\n"
    );
    assert_eq!(
        run("make \"i 0 do.until [make \"i :i + 1 pr :i] [:i > 1]"),
        "1\n2\n"
    );
}

#[test]
fn for_loop_steps() {
    assert_eq!(run("for [i 1 4] [type :i]"), "1234");
    assert_eq!(run("for [i 4 1] [type :i]"), "4321");
    assert_eq!(run("for [i 0 10 5] [type :i]"), "0510");
    assert_eq!(run("for [i 10 0 -5] [type :i]"), "1050");
}

#[test]
fn case_and_cond() {
    assert_eq!(
        run("pr case 2 [[[1] \"one] [[2 3] \"both] [else \"other]]"),
        "both\n"
    );
    assert_eq!(run("pr case 9 [[[1] \"one] [else \"other]]"), "other\n");
    assert_eq!(
        run("make \"x 4 pr cond [[[:x < 3] \"small] [[:x < 10] \"medium] [else \"big]]"),
        "medium\n"
    );
}

#[test]
fn and_or_short_circuit() {
    // The decisive operand stops evaluation: no output after it.
    assert_eq!(run("pr and [0] [pr \"side 1]"), "false\n");
    assert_eq!(run("pr or [1] [pr \"side 0]"), "true\n");
    assert_eq!(run("pr (and 1 1 1)"), "true\n");
    assert_eq!(run("pr (or 0 0 1)"), "true\n");
    assert_eq!(run("pr xor 1 0"), "true\n");
    assert_eq!(run("pr not 0"), "true\n");
}

#[test]
fn run_and_runresult() {
    assert_eq!(run("run [pr 7]"), "7\n");
    assert_eq!(run("pr run [3 + 4]"), "7\n");
    assert_eq!(run("show runresult [3 + 4]"), "[7]\n");
    assert_eq!(run("show runresult [fd 0]"), "[]\n");
}

#[test]
fn ignore_discards_a_value() {
    assert_eq!(run("ignore 3 + 4 pr \"done"), "done\n");
}

// ===========================================================================
// Higher-order procedures
// ===========================================================================

#[test]
fn map_filter_find_reduce() {
    assert_eq!(run("show map [? * 2] [1 2 3]"), "[2 4 6]\n");
    assert_eq!(run("show map \"minus [1 2]"), "[-1 -2]\n");
    assert_eq!(run("show filter [? > 2] [1 2 3 4]"), "[3 4]\n");
    assert_eq!(run("pr find [? > 2] [1 2 3 4]"), "3\n");
    assert_eq!(run("show find [? > 9] [1 2]"), "[]\n");
    assert_eq!(run("pr reduce \"sum [1 2 3 4]"), "10\n");
    assert_eq!(run("pr reduce [word ?1 ?2] [a b c]"), "abc\n");
    assert_eq!(run("pr apply \"sum [3 4]"), "7\n");
    assert_eq!(run("pr (invoke \"sum 3 4)"), "7\n");
    assert_eq!(run("foreach [a b c] [type ?]"), "abc");
    assert_eq!(run("show (map [sum ?1 ?2] [1 2] [10 20])"), "[11 22]\n");
    assert_eq!(
        run("show crossmap [word ?1 ?2] [[a b] [1 2]]"),
        "[a1 a2 b1 b2]\n"
    );
}

#[test]
fn templates_work_with_user_procedures() {
    assert_eq!(
        run("to double :n output :n * 2 end show map \"double [1 2 3]"),
        "[2 4 6]\n"
    );
}

// ===========================================================================
// Workspace
// ===========================================================================

#[test]
fn make_thing_local_global() {
    assert_eq!(run("make \"x 5 pr thing \"x"), "5\n");
    assert_eq!(run("make \"x 5 pr namep \"x"), "true\n");
    assert_eq!(run("pr namep \"nope"), "false\n");
    assert_eq!(run("global \"g make \"g 1 pr :g"), "1\n");
    assert_eq!(run("localmake \"x 9 pr :x"), "9\n");
    assert_eq!(run_err("pr :nope"), "Don't know about variable NOPE");
    // LOCAL leaves the binding valueless.
    assert_eq!(run_err("to f local \"x pr :x end f"), "Don't know about variable X");
}

#[test]
fn property_lists() {
    assert_eq!(run("pprop \"pets \"dog \"rex pr gprop \"pets \"dog"), "rex\n");
    assert_eq!(run("pprop \"Pets \"Dog \"rex pr gprop \"PETS \"DOG"), "rex\n");
    assert_eq!(run("show gprop \"pets \"cat"), "[]\n");
    assert_eq!(
        run("pprop \"pets \"dog \"rex remprop \"pets \"dog show gprop \"pets \"dog"),
        "[]\n"
    );
    assert_eq!(
        run("pprop \"pets \"dog \"rex pprop \"pets \"cat \"tom show plist \"pets"),
        "[CAT tom DOG rex]\n"
    );
    assert_eq!(run("pprop \"a \"b 1 pr plistp \"a"), "true\n");
    assert_eq!(run("pr plistp \"zzz"), "false\n");
    assert_eq!(run("pprop \"a \"b 1 erpl \"a pr plistp \"a"), "false\n");
}

#[test]
fn procedure_definition_and_queries() {
    assert_eq!(run("to sq :n fd :n end pr definedp \"sq"), "true\n");
    assert_eq!(run("pr primitivep \"print"), "true\n");
    assert_eq!(run("pr procedurep \"print"), "true\n");
    assert_eq!(run("to sq fd 1 end show procedures"), "[sq]\n");
    assert_eq!(run("to sq fd 1 end erase \"sq pr definedp \"sq"), "false\n");
    assert_eq!(run("to sq fd 1 end erps pr definedp \"sq"), "false\n");
    assert_eq!(run("make \"x 1 erns pr namep \"x"), "false\n");
    assert_eq!(run("to f output 1 end copydef \"g \"f pr g"), "1\n");
    assert_eq!(run("show arity \"sum"), "[2 2 -1]\n");
    assert_eq!(run("to f :a :b fd 1 end show arity \"f"), "[2 2 2]\n");
}

#[test]
fn redefinition_gates() {
    assert_eq!(
        run_err("to print :x fd 1 end"),
        "Can't redefine primitive PRINT"
    );
    assert_eq!(run_err("to to fd 1 end"), "Can't redefine special form TO");
    assert_eq!(
        run_err("erase \"print"),
        "Can't erase primitives unless REDEFP is TRUE"
    );
    assert_eq!(run_err("erase \"to"), "Can't erase special form TO");
    // REDEFP opens the gate.
    assert_eq!(
        run("make \"redefp \"true to print :x fd 1 end pr definedp \"print"),
        "true\n"
    );
}

#[test]
fn def_text_and_define_round_trip() {
    assert_eq!(
        run("to sq :n repeat 4 [fd :n rt 90] end pr def \"sq"),
        "to sq :n\n  repeat 4 [fd :n rt 90]\nend\n"
    );
    assert_eq!(
        run("to sq :n fd :n end show text \"sq"),
        "[[n] [fd :n]]\n"
    );
    // DEFINE re-registers from the TEXT shape; behaviour is preserved.
    let src = "to sq :n repeat 4 [fd :n rt 90] end \
               define \"sq2 text \"sq \
               sq2 10";
    let mut f = fixture();
    f.it.run(src).expect("runs");
    let log = f.log.borrow().clone();
    assert_eq!(log.iter().filter(|e| *e == "move(10)").count(), 4);
}

#[test]
fn define_requires_two_part_shape() {
    assert_eq!(
        run_err("define \"f [[a] [pr :a] [extra]]"),
        "DEFINE: Expected list of length 2"
    );
}

#[test]
fn bury_and_trace_flags() {
    assert_eq!(run("to f fd 1 end bury \"f pr buriedp \"f"), "true\n");
    assert_eq!(run("to f fd 1 end bury \"f show procedures"), "[]\n");
    assert_eq!(run("to f fd 1 end bury \"f unbury \"f pr buriedp \"f"), "false\n");
    assert_eq!(run("trace \"print pr tracedp \"print"), "true\n");
    assert_eq!(run("step \"print pr steppedp \"print"), "true\n");
    // Buried names are still deleted by ERNS (observed behaviour).
    assert_eq!(run("make \"x 1 bury \"x erns pr namep \"x"), "false\n");
}

#[test]
fn contents_shape() {
    assert_eq!(
        run("to f fd 1 end make \"v 2 pprop \"p \"k 3 show contents"),
        "[[f] [V] [P]]\n"
    );
}

#[test]
fn save_hook_sees_definitions_and_erasures() {
    let events: Rc<RefCell<Vec<(String, Option<String>)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    let mut f = fixture();
    f.it.set_save_hook(Some(Box::new(move |name, text| {
        sink.borrow_mut()
            .push((name.to_string(), text.map(str::to_string)));
    })));
    f.it.run("to sq :n fd :n end erase \"sq").expect("runs");
    let events = events.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, "sq");
    assert_eq!(events[0].1.as_deref(), Some("to sq :n\n  fd :n\nend"));
    assert_eq!(events[1], ("sq".to_string(), None));
}

#[test]
fn keyword_alias_hook_translates_end() {
    let mut f = fixture();
    f.it.set_keyword_alias(Some(Rc::new(|word: &str| {
        if word == "FIN" {
            Some("END".to_string())
        } else {
            None
        }
    })));
    f.it.run("to sq fd 10 fin sq").expect("runs");
    assert_eq!(f.log.borrow().as_slice(), ["move(10)"]);
}

#[test]
fn localize_hook_translates_errors() {
    let mut f = fixture();
    f.it.set_localize(Some(Rc::new(|template: &str| {
        if template == "Don't know how to {name:U}" {
            Some("Je ne sais pas {name:U}".to_string())
        } else {
            None
        }
    })));
    let err = f.it.run("frobnicate").expect_err("unknown proc");
    assert_eq!(err.message, "Je ne sais pas FROBNICATE");
}

// ===========================================================================
// Turtle delegation
// ===========================================================================

#[test]
fn square_produces_four_moves_and_turns() {
    let mut f = fixture();
    f.it.run("repeat 4 [fd 50 rt 90]").expect("runs");
    assert_eq!(
        f.log.borrow().as_slice(),
        [
            "move(50)", "turn(90)", "move(50)", "turn(90)", "move(50)", "turn(90)", "move(50)",
            "turn(90)"
        ]
    );
    assert_eq!(&*f.out.borrow(), "");
}

#[test]
fn movement_and_queries() {
    assert_eq!(run("fd 10 show pos"), "[0 10]\n");
    assert_eq!(run("rt 90 pr heading"), "90\n");
    assert_eq!(run("seth 180 pr heading"), "180\n");
    assert_eq!(run("setxy 3 4 pr xcor pr ycor"), "3\n4\n");
    assert_eq!(run("pr towards [0 10]"), "0\n");
    assert_eq!(run("fd 10 home show pos"), "[0 0]\n");
    assert_eq!(run("pr shownp"), "true\n");
    assert_eq!(run("ht pr shownp"), "false\n");
    assert_eq!(run("pr pendownp"), "true\n");
    assert_eq!(run("pu pr pendownp"), "false\n");
    assert_eq!(run("pe pr penmode"), "erase\n");
    assert_eq!(run("pr turtlemode"), "wrap\n");
    assert_eq!(run("fence pr turtlemode"), "fence\n");
    assert_eq!(run("setscrunch 2 3 show scrunch"), "[2 3]\n");
    assert_eq!(
        run_err("setscrunch 0 1"),
        "SETSCRUNCH: Expected number greater than zero"
    );
}

#[test]
fn colors_and_pen() {
    let mut f = fixture();
    f.it.run("setpc [255 0 0] setbg \"blue setwidth 3").expect("runs");
    assert_eq!(
        f.log.borrow().as_slice(),
        ["setcolor(#ff0000)", "setbgcolor(blue)", "setwidth(3)"]
    );
    assert_eq!(run("setpc \"red pr pc"), "red\n");
}

#[test]
fn label_draws_text() {
    let mut f = fixture();
    f.it.run("label [hello world]").expect("runs");
    assert_eq!(f.log.borrow().as_slice(), ["drawtext(hello world)"]);
}

// ===========================================================================
// Stream input
// ===========================================================================

#[test]
fn readword_and_readlist() {
    let mut f = fixture_with_reads(&["hello there", "a [b c] 3"]);
    f.it.run("pr readword show readlist").expect("runs");
    assert_eq!(&*f.out.borrow(), "hello there\n[a [b c] 3]\n");
}

#[test]
fn cleartext_clears_the_stream() {
    assert_eq!(run("pr 1 ct pr 2"), "2\n");
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn iseq_spans_inclusive_range(a in -50i64..50, b in -50i64..50) {
        let out = run(&format!("pr count iseq {a} {b}"));
        let expected = (a - b).abs() + 1;
        prop_assert_eq!(out.trim().parse::<i64>().unwrap(), expected);
    }

    #[test]
    fn reverse_is_an_involution(len in 0usize..8) {
        let items: Vec<String> = (0..len).map(|i| format!("w{i}")).collect();
        let list = items.join(" ");
        let out = run(&format!("show reverse reverse [{list}]"));
        prop_assert_eq!(out.trim(), format!("[{list}]"));
    }

    #[test]
    fn numeric_words_equal_their_numbers(n in -1000i64..1000) {
        let out = run(&format!("pr equalp \"{n} {n}"));
        prop_assert_eq!(out, "true\n");
    }
}
