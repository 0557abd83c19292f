use leptos::prelude::*;
use leptos_ui::clx;
use tw_merge::tw_merge;

clx! {Tooltip, div, "inline-block relative mx-0 whitespace-nowrap transition-all duration-300 ease-in-out group/tooltip my-[5px]"}

#[derive(Clone, Copy, Default, strum::Display, strum::AsRefStr)]
pub enum TooltipPosition {
    #[default]
    Top,
    Bottom,
}

#[component]
pub fn TooltipContent(
    #[prop(into, optional)] class: String,
    #[prop(default = TooltipPosition::default())] position: TooltipPosition,
    children: Children,
) -> impl IntoView {
    const SHARED_TRANSITION_CLASSES: &str = "absolute opacity-0 transition-all duration-300 ease-in-out pointer-events-none group-hover/tooltip:opacity-100 group-hover/tooltip:pointer-events-auto z-[1000000]";

    let position_class = match position {
        TooltipPosition::Top => "left-1/2 bottom-full mb-1 -ml-2.5",
        TooltipPosition::Bottom => "left-1/2 top-full mt-1 -ml-2.5",
    };

    let arrow_position_class = match position {
        TooltipPosition::Top => "left-1/2 bottom-full -mb-2 border-t-foreground/90",
        TooltipPosition::Bottom => "left-1/2 top-full -mt-2 border-b-foreground/90",
    };

    let tooltip_class = tw_merge!(
        SHARED_TRANSITION_CLASSES,
        "py-2 px-2.5 text-xs whitespace-nowrap shadow-lg text-background bg-foreground/90 rounded-md",
        class,
        position_class,
    );

    let arrow_class = tw_merge!(
        SHARED_TRANSITION_CLASSES,
        "bg-transparent border-transparent border-6",
        arrow_position_class,
    );

    view! {
        <>
            <div data-name="TooltipArrow" data-position=position.as_ref().to_string() class=arrow_class />
            <div data-name="TooltipContent" data-position=position.as_ref().to_string() class=tooltip_class>
                {children()}
            </div>
        </>
    }
}
